//! Asset error types.

use std::borrow::Cow;

use lumen_image::VariantSize;
use lumen_object::types::Error as ObjectError;

/// Result type alias for asset operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Asset error type.
///
/// Every variant is terminal for the operation that produced it. Only the
/// storage variants wrap a backend error, so callers can consult
/// [`ObjectError::is_retryable`] before retrying a whole ingestion.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The supplied filename is empty or cannot be split into name and
    /// extension.
    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    /// A minted or caller-provided asset identifier is not usable in
    /// storage keys and references.
    #[error("invalid asset id {id:?}: {reason}")]
    InvalidAssetId { id: String, reason: &'static str },

    /// The upload bytes are not a raster image this build can decode.
    #[error("unsupported image format")]
    UnsupportedImageFormat(#[source] lumen_image::Error),

    /// A downscaled rendition could not be produced after decoding
    /// succeeded.
    #[error("failed to encode image variant")]
    Encoding(#[source] lumen_image::Error),

    /// A blocking image task panicked or was aborted before producing a
    /// result.
    #[error("image processing task failed")]
    ImageTask(#[source] lumen_image::Error),

    /// The upload stream exceeded the configured size limit.
    #[error("upload exceeds the {limit} byte limit")]
    UploadTooLarge { limit: u64 },

    /// The upload stream failed before it was fully read.
    #[error("failed to read upload stream")]
    SourceRead(#[source] std::io::Error),

    /// Writing a variant to the object store failed.
    #[error("failed to write {key}")]
    StorageWrite {
        key: String,
        #[source]
        source: ObjectError,
    },

    /// Reading a variant's headers from the object store failed for a
    /// reason other than absence.
    #[error("failed to read {key}")]
    StorageRead {
        key: String,
        #[source]
        source: ObjectError,
    },

    /// The reference string does not follow `image:{id}_{size}.{ext}`.
    #[error("invalid image reference: {0:?}")]
    InvalidReference(String),

    /// The variant a reference designates does not exist.
    #[error("asset variant not found: {key} ({size})")]
    AssetVariantNotFound { key: String, size: VariantSize },

    /// A request carried both an upload and a reference, or neither.
    #[error("conflicting input: {0}")]
    ConflictingInput(Cow<'static, str>),

    /// The caller cancelled the operation.
    #[error("operation cancelled")]
    Cancelled,

    /// The engine configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(Cow<'static, str>),
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a conflicting-input error.
    pub fn conflicting_input(message: impl Into<Cow<'static, str>>) -> Self {
        Self::ConflictingInput(message.into())
    }

    /// Creates a storage write error for `key`.
    pub fn storage_write(key: impl Into<String>, source: ObjectError) -> Self {
        Self::StorageWrite {
            key: key.into(),
            source,
        }
    }

    /// Creates a storage read error for `key`.
    pub fn storage_read(key: impl Into<String>, source: ObjectError) -> Self {
        Self::StorageRead {
            key: key.into(),
            source,
        }
    }

    /// Returns `true` if retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StorageWrite { source, .. } | Self::StorageRead { source, .. } => {
                source.is_retryable()
            }
            _ => false,
        }
    }
}

impl From<lumen_image::Error> for Error {
    fn from(error: lumen_image::Error) -> Self {
        match error {
            lumen_image::Error::UnsupportedFormat { .. } => Self::UnsupportedImageFormat(error),
            lumen_image::Error::Encoding { .. } => Self::Encoding(error),
            lumen_image::Error::Task(_) => Self::ImageTask(error),
        }
    }
}
