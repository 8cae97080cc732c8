#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET_INGEST: &str = "lumen_asset::ingest";
pub const TRACING_TARGET_UPLOAD: &str = "lumen_asset::upload";
pub const TRACING_TARGET_RESOLVE: &str = "lumen_asset::resolve";

mod asset_id;
mod cancel;
mod config;
mod descriptor;
mod error;
pub mod filename;
mod hooks;
mod input;
pub mod reference;
pub mod resolve;
pub mod src_url;
mod store;
pub mod upload;

#[cfg(test)]
mod testing;

pub use lumen_image::{VariantSize, Variants};

pub use crate::asset_id::AssetId;
pub use crate::config::AssetConfig;
pub use crate::descriptor::{ImageAsset, VariantDescriptor};
pub use crate::error::{Error, Result};
pub use crate::filename::{FilenameParts, FilenameSanitizer, FilenameTransform};
pub use crate::hooks::{AssetHooks, MintContext, UploadParams};
pub use crate::input::{AssetInput, ByteStream, ImageUpload};
pub use crate::reference::ImageRef;
pub use crate::store::{AssetStore, IngestedImage};
