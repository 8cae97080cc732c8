//! Writes encoded variants to the object store.

use bytes::Bytes;
use lumen_object::client::{ObjectStoreClient, PutOutput};
use lumen_object::types::PutHeaders;
use url::form_urlencoded;

use crate::{AssetConfig, AssetHooks, Error, Result, TRACING_TARGET_UPLOAD, VariantDescriptor};

/// Metadata key holding the caller-supplied upload filename.
pub const META_ORIGINAL_FILENAME: &str = "original-filename";
/// Metadata key holding the variant height in pixels.
pub const META_IMAGE_HEIGHT: &str = "image-height";
/// Metadata key holding the variant width in pixels.
pub const META_IMAGE_WIDTH: &str = "image-width";

/// Writes one variant per call, tagging it with its dimensions.
#[derive(Debug, Clone, Copy)]
pub struct AssetUploader<'a> {
    client: &'a ObjectStoreClient,
    config: &'a AssetConfig,
    hooks: &'a AssetHooks,
}

impl<'a> AssetUploader<'a> {
    /// Creates an uploader writing into `config`'s folder.
    pub fn new(
        client: &'a ObjectStoreClient,
        config: &'a AssetConfig,
        hooks: &'a AssetHooks,
    ) -> Self {
        Self {
            client,
            config,
            hooks,
        }
    }

    /// Builds the headers written alongside `descriptor`.
    ///
    /// The engine's own metadata is set first; headers from the
    /// [`AssetHooks::with_upload_params`] hook are applied afterwards and
    /// replace engine values that map to the same header.
    pub fn headers(
        &self,
        descriptor: &VariantDescriptor,
        content_type: &str,
        original_filename: &str,
    ) -> PutHeaders {
        let mut headers = PutHeaders::new()
            .with_content_type(content_type)
            .with_metadata(META_ORIGINAL_FILENAME, encode_header_value(original_filename))
            .with_metadata(META_IMAGE_HEIGHT, descriptor.height().to_string())
            .with_metadata(META_IMAGE_WIDTH, descriptor.width().to_string());

        for (name, value) in self.hooks.upload_params(descriptor) {
            headers = headers.with_header(&name, value);
        }

        headers
    }

    /// Writes `data` as the variant `descriptor` describes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageWrite`] if the store rejects the write.
    pub async fn upload(
        &self,
        descriptor: &VariantDescriptor,
        data: Bytes,
        content_type: &str,
        original_filename: &str,
    ) -> Result<PutOutput> {
        let key = descriptor.reference().storage_key(self.config.folder());
        let headers = self.headers(descriptor, content_type, original_filename);

        let output = self
            .client
            .put(&key, data, headers)
            .await
            .map_err(|e| Error::storage_write(&key, e))?;

        tracing::debug!(
            target: TRACING_TARGET_UPLOAD,
            key = %key,
            size = %descriptor.size(),
            width = descriptor.width(),
            height = descriptor.height(),
            bytes = descriptor.filesize(),
            "variant stored"
        );

        Ok(output)
    }
}

/// Makes `value` safe for a store metadata header.
///
/// Header values must be printable ASCII, so `value` is form-urlencoded.
/// Names made of letters, digits, `-`, `.` and `_` pass through unchanged.
pub fn encode_header_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}
