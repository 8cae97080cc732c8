#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

// Tracing target constants for consistent logging
pub const TRACING_TARGET: &str = "lumen_image";

mod error;
pub mod generator;
pub mod pipeline;
mod size;

pub use image::ImageFormat;

pub use crate::error::{Error, Result};
pub use crate::generator::{GeneratorOptions, VariantGenerator};
pub use crate::pipeline::{ImagePipeline, RasterInfo, RenderedVariant};
pub use crate::size::{VariantSize, Variants};
