//! Variant generation error types.

use std::borrow::Cow;

use crate::VariantSize;

/// Result type alias for variant generation.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Variant generation error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The source could not be decoded as a raster image at all.
    #[error("unsupported image format: {message}")]
    UnsupportedFormat {
        message: Cow<'static, str>,
        #[source]
        source: Option<image::ImageError>,
    },

    /// A resize or encode step failed after the source decoded.
    #[error("failed to encode {size} variant: {source}")]
    Encoding {
        size: VariantSize,
        #[source]
        source: image::ImageError,
    },

    /// A blocking image task panicked or was cancelled.
    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl Error {
    /// Creates an unsupported-format error with a message.
    pub fn unsupported(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an unsupported-format error with a message and source.
    pub fn unsupported_with_source(
        message: impl Into<Cow<'static, str>>,
        source: image::ImageError,
    ) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates an encoding error for the given variant.
    pub fn encoding(size: VariantSize, source: image::ImageError) -> Self {
        Self::Encoding { size, source }
    }
}
