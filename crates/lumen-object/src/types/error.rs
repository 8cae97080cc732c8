//! Error type for object-store operations.

use std::fmt;

use strum::{AsRefStr, IntoStaticStr};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Result type alias for object-store operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad category of an object-store failure.
///
/// Callers branch on this rather than on the message: a missing key is an
/// expected outcome for header lookups, everything else is a real failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// No object exists at the requested key.
    NotFound,
    /// The credentials lack permission for the operation.
    PermissionDenied,
    /// The credentials were rejected.
    Unauthenticated,
    /// A create-only write hit an existing key.
    AlreadyExists,
    /// A conditional request failed its precondition.
    Precondition,
    /// The backend does not implement the requested feature.
    NotImplemented,
    /// The client could not be built or the backend could not be reached.
    Connection,
    /// Any other backend failure (network, throttling, server errors).
    Other,
}

/// An error carrying a kind, a message, an optional source, and a
/// retryable flag.
pub struct Error {
    kind: ErrorKind,
    message: String,
    source: Option<BoxedError>,
    retryable: bool,
}

impl Error {
    /// Create a runtime error formatted as `[{label}] {msg}`.
    pub fn runtime(kind: ErrorKind, msg: impl fmt::Display, label: &str, retryable: bool) -> Self {
        Self {
            kind,
            message: format!("[{label}] {msg}"),
            source: None,
            retryable,
        }
    }

    /// Create a connection error formatted as `[{label}] {msg}`.
    pub fn connection(msg: impl fmt::Display, label: &str, retryable: bool) -> Self {
        Self {
            kind: ErrorKind::Connection,
            message: format!("[{label}] {msg}"),
            source: None,
            retryable,
        }
    }

    /// Attach a source error.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the object was missing.
    pub fn is_not_found(&self) -> bool {
        self.kind == ErrorKind::NotFound
    }

    /// Whether the caller should retry this operation.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("retryable", &self.retryable)
            .field("source", &self.source)
            .finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<object_store::Error> for Error {
    fn from(err: object_store::Error) -> Self {
        let kind = match &err {
            object_store::Error::NotFound { .. } => ErrorKind::NotFound,
            object_store::Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            object_store::Error::Unauthenticated { .. } => ErrorKind::Unauthenticated,
            object_store::Error::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            object_store::Error::Precondition { .. } => ErrorKind::Precondition,
            object_store::Error::NotImplemented { .. } => ErrorKind::NotImplemented,
            _ => ErrorKind::Other,
        };
        let retryable = kind == ErrorKind::Other;
        Error::runtime(kind, err.to_string(), "object-store", retryable).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_retryable() {
        let err = Error::from(object_store::Error::NotFound {
            path: "a/b".to_string(),
            source: "gone".into(),
        });
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert_eq!(err.kind().as_ref(), "not_found");
    }

    #[test]
    fn generic_errors_are_retryable() {
        let err = Error::from(object_store::Error::Generic {
            store: "S3",
            source: "throttled".into(),
        });
        assert_eq!(err.kind(), ErrorKind::Other);
        assert!(err.is_retryable());
        assert!(err.to_string().starts_with("[object-store]"));
    }
}
