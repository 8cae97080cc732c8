//! Shared types for object-store operations.

pub mod error;
pub mod metadata;

pub use error::{Error, ErrorKind, Result};
pub use metadata::{ObjectHeaders, PutHeaders};
