//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── command: Command          # ingest, resolve, src, verify
//! ├── asset: AssetConfig        # Bucket, folder, public URLs
//! └── storage: StorageConfig    # S3 region, endpoint, credentials
//! ```
//!
//! All configuration can be provided via CLI arguments or environment
//! variables. Use `--help` to see all available options.
//!
//! # Example
//!
//! ```bash
//! lumen --asset-bucket photos ingest ./beach.jpg
//!
//! # Or via environment variables
//! ASSET_BUCKET=photos S3_ENDPOINT=http://localhost:9000 lumen resolve image:abc_full.jpg
//! ```

mod storage;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lumen_asset::{AssetConfig, VariantSize};
pub use storage::StorageConfig;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "lumen")]
#[command(about = "Ingest images into object storage and resolve their references")]
#[command(version)]
pub struct Cli {
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,

    /// Bucket, folder and public URL configuration.
    #[clap(flatten)]
    pub asset: AssetConfig,

    /// Object storage connection.
    #[clap(flatten)]
    pub storage: StorageConfig,
}

/// Operations the CLI exposes.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Ingest an image file and print the stored asset.
    Ingest {
        /// Path of the image to upload.
        path: PathBuf,

        /// Filename to record instead of the file's own name.
        #[arg(long)]
        filename: Option<String>,

        /// Content type to store instead of the detected one.
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Resolve a reference and print the asset's variants.
    Resolve {
        /// Reference returned by a previous ingestion.
        reference: String,
    },

    /// Resolve a reference and print the public URL of one variant.
    Src {
        /// Reference returned by a previous ingestion.
        reference: String,

        /// Variant to print the URL of, defaults to the referenced one.
        #[arg(long)]
        size: Option<VariantSize>,
    },

    /// Check that the configured bucket is reachable.
    Verify,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so command output on stdout stays machine-readable.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.asset
            .validate()
            .context("invalid asset configuration")?;
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            bucket = %self.asset.bucket,
            folder = %self.asset.folder(),
            base_url = ?self.asset.base_url.as_ref().map(|u| u.as_str()),
            public_endpoint = %self.asset.public_endpoint(),
            jpeg_quality = self.asset.jpeg_quality,
            max_upload_bytes = self.asset.max_upload_bytes,
            "asset configuration"
        );
        self.storage.log();
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}
