//! Asset engine configuration.

#[cfg(feature = "config")]
use clap::Args;
use lumen_image::GeneratorOptions;
use lumen_image::pipeline::DEFAULT_JPEG_QUALITY;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Default storage folder variants are written into.
pub const DEFAULT_FOLDER: &str = "images";

/// Default cap on the size of one upload, 32 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 32 * 1024 * 1024;

/// Storage and URL settings of the asset engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(rename_all = "camelCase")]
pub struct AssetConfig {
    /// Bucket variants are stored in.
    #[cfg_attr(feature = "config", arg(long = "asset-bucket", env = "ASSET_BUCKET"))]
    pub bucket: String,

    /// Folder (key prefix) variants are stored under.
    #[cfg_attr(
        feature = "config",
        arg(long = "asset-folder", env = "ASSET_FOLDER", default_value = DEFAULT_FOLDER)
    )]
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Public base URL (for example a CDN) that variant filenames are
    /// appended to directly.
    #[cfg_attr(feature = "config", arg(long = "asset-base-url", env = "ASSET_BASE_URL"))]
    #[serde(default)]
    pub base_url: Option<Url>,

    /// Public endpoint of the bucket, defaults to the S3 virtual-hosted
    /// endpoint `https://{bucket}.s3.amazonaws.com`.
    #[cfg_attr(
        feature = "config",
        arg(long = "asset-public-endpoint", env = "ASSET_PUBLIC_ENDPOINT")
    )]
    #[serde(default)]
    pub public_endpoint: Option<Url>,

    /// Quality (1-100) of derived JPEG renditions.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "asset-jpeg-quality",
            env = "ASSET_JPEG_QUALITY",
            default_value_t = DEFAULT_JPEG_QUALITY
        )
    )]
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Largest upload, in bytes, the engine reads before giving up.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "asset-max-upload-bytes",
            env = "ASSET_MAX_UPLOAD_BYTES",
            default_value_t = DEFAULT_MAX_UPLOAD_BYTES
        )
    )]
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_folder() -> String {
    DEFAULT_FOLDER.to_owned()
}

fn default_jpeg_quality() -> u8 {
    DEFAULT_JPEG_QUALITY
}

fn default_max_upload_bytes() -> u64 {
    DEFAULT_MAX_UPLOAD_BYTES
}

impl AssetConfig {
    /// Creates a configuration for `bucket` with default settings.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            folder: default_folder(),
            base_url: None,
            public_endpoint: None,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Sets the storage folder.
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Sets the public base URL.
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the public bucket endpoint.
    pub fn with_public_endpoint(mut self, endpoint: Url) -> Self {
        self.public_endpoint = Some(endpoint);
        self
    }

    /// Sets the JPEG quality of derived renditions.
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Sets the upload size limit.
    pub fn with_max_upload_bytes(mut self, limit: u64) -> Self {
        self.max_upload_bytes = limit;
        self
    }

    /// Returns the folder without leading or trailing slashes.
    pub fn folder(&self) -> &str {
        self.folder.trim_matches('/')
    }

    /// Returns the public endpoint of the bucket.
    pub fn public_endpoint(&self) -> String {
        match &self.public_endpoint {
            Some(endpoint) => endpoint.to_string(),
            None => format!("https://{}.s3.amazonaws.com", self.bucket),
        }
    }

    /// Returns the generator options derived from this configuration.
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            jpeg_quality: self.jpeg_quality,
        }
    }

    /// Checks the configuration for values the engine cannot work with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an empty bucket, a folder containing
    /// empty path segments, a JPEG quality outside 1-100, or a zero upload
    /// limit.
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::config("bucket must not be empty"));
        }
        if self.folder().split('/').any(str::is_empty) && !self.folder().is_empty() {
            return Err(Error::config("folder must not contain empty path segments"));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(Error::config("jpeg quality must be between 1 and 100"));
        }
        if self.max_upload_bytes == 0 {
            return Err(Error::config("max upload size must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AssetConfig::new("photos");
        assert_eq!(config.folder(), "images");
        assert_eq!(config.public_endpoint(), "https://photos.s3.amazonaws.com");
        assert_eq!(config.generator_options().jpeg_quality, DEFAULT_JPEG_QUALITY);
        config.validate().unwrap();
    }

    #[test]
    fn folder_slashes_are_trimmed() {
        let config = AssetConfig::new("photos").with_folder("/uploads/avatars/");
        assert_eq!(config.folder(), "uploads/avatars");
        config.validate().unwrap();

        AssetConfig::new("photos").with_folder("").validate().unwrap();
    }

    #[test]
    fn rejects_unusable_values() {
        assert!(AssetConfig::new(" ").validate().is_err());
        assert!(AssetConfig::new("b").with_folder("a//b").validate().is_err());
        assert!(AssetConfig::new("b").with_jpeg_quality(0).validate().is_err());
        assert!(AssetConfig::new("b").with_max_upload_bytes(0).validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: AssetConfig = serde_json::from_value(serde_json::json!({
            "bucket": "photos",
            "baseUrl": "https://cdn.example.com/img/",
        }))
        .unwrap();

        assert_eq!(config.folder, DEFAULT_FOLDER);
        assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(
            config.base_url.unwrap().as_str(),
            "https://cdn.example.com/img/"
        );
    }
}
