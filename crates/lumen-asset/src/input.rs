//! Caller inputs: raw uploads and references.

use std::fmt;
use std::io;

use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream};
use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::cancel::until_cancelled;
use crate::{Error, Result};

/// Stream of upload chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A raw image upload.
pub struct ImageUpload {
    filename: String,
    content_type: Option<String>,
    stream: ByteStream,
}

impl ImageUpload {
    /// Creates an upload reading its bytes from `stream`.
    pub fn new(
        filename: impl Into<String>,
        stream: impl Stream<Item = io::Result<Bytes>> + Send + 'static,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: None,
            stream: stream.boxed(),
        }
    }

    /// Creates an upload from bytes already in memory.
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self::new(filename, stream::once(async move { Ok(data) }))
    }

    /// Sets the content type the client declared for the upload.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the filename as supplied by the caller.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Returns the declared content type, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Drains the stream into one contiguous buffer of at most `limit`
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceRead`] if a chunk fails,
    /// [`Error::UploadTooLarge`] as soon as the stream passes `limit`, and
    /// [`Error::Cancelled`] if `cancel` fires first.
    pub async fn read_all(&mut self, cancel: &CancellationToken, limit: u64) -> Result<Bytes> {
        let mut buffer = BytesMut::new();
        while let Some(chunk) = until_cancelled(cancel, self.stream.next()).await? {
            let chunk = chunk.map_err(Error::SourceRead)?;
            if (buffer.len() + chunk.len()) as u64 > limit {
                return Err(Error::UploadTooLarge { limit });
            }
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// What a caller hands the engine: a new upload or an existing reference.
#[derive(Debug)]
pub enum AssetInput {
    /// Ingest a new image.
    Upload(ImageUpload),
    /// Resolve a previously returned reference.
    Ref(String),
}

impl AssetInput {
    /// Builds an input from a request that may carry either field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingInput`] if both or neither are present.
    pub fn from_parts(upload: Option<ImageUpload>, reference: Option<String>) -> Result<Self> {
        match (upload, reference) {
            (Some(upload), None) => Ok(Self::Upload(upload)),
            (None, Some(reference)) => Ok(Self::Ref(reference)),
            (Some(_), Some(_)) => Err(Error::conflicting_input(
                "request carries both an upload and a reference",
            )),
            (None, None) => Err(Error::conflicting_input(
                "request carries neither an upload nor a reference",
            )),
        }
    }
}
