//! Async variant generation service.
//!
//! Decoding and resizing are CPU-bound, so both run on tokio's blocking
//! pool. The decoded [`ImagePipeline`] is shared behind an [`Arc`] and the
//! three downscaled renditions are derived concurrently from it.

use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::pipeline::{DEFAULT_JPEG_QUALITY, ImagePipeline, RenderedVariant};
use crate::{Result, TRACING_TARGET, VariantSize, Variants};

/// Options for variant generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorOptions {
    /// Quality for JPEG renditions (1-100).
    pub jpeg_quality: u8,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Service producing the four renditions of a source image.
#[derive(Debug, Clone, Default)]
pub struct VariantGenerator {
    options: GeneratorOptions,
}

impl VariantGenerator {
    /// Creates a generator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a generator with the given options.
    pub fn with_options(options: GeneratorOptions) -> Self {
        Self { options }
    }

    /// Returns the generator options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Decodes `source` on the blocking pool.
    pub async fn decode(&self, source: Bytes) -> Result<Arc<ImagePipeline>> {
        let quality = self.options.jpeg_quality;
        let pipeline = tokio::task::spawn_blocking(move || {
            ImagePipeline::decode(source).map(|p| p.with_jpeg_quality(quality))
        })
        .await??;

        Ok(Arc::new(pipeline))
    }

    /// Renders one size from a shared pipeline on the blocking pool.
    pub async fn render(
        &self,
        pipeline: &Arc<ImagePipeline>,
        size: VariantSize,
    ) -> Result<RenderedVariant> {
        let pipeline = Arc::clone(pipeline);
        tokio::task::spawn_blocking(move || pipeline.render(size)).await?
    }

    /// Decodes `source` once and produces all four renditions.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedFormat`](crate::Error::UnsupportedFormat)
    /// if the source does not decode, and with
    /// [`Error::Encoding`](crate::Error::Encoding) if any rendition cannot be
    /// encoded.
    pub async fn generate(&self, source: Bytes) -> Result<Variants<RenderedVariant>> {
        let pipeline = self.decode(source).await?;
        let full = pipeline.render(VariantSize::Full)?;

        let (sm, md, lg) = tokio::try_join!(
            self.render(&pipeline, VariantSize::Sm),
            self.render(&pipeline, VariantSize::Md),
            self.render(&pipeline, VariantSize::Lg),
        )?;

        tracing::debug!(
            target: TRACING_TARGET,
            format = ?pipeline.format(),
            bytes = full.byte_size() + sm.byte_size() + md.byte_size() + lg.byte_size(),
            "variants generated"
        );

        Ok(Variants { full, sm, md, lg })
    }
}
