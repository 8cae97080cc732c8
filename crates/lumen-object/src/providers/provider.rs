//! Client trait for creating authenticated object-store connections.

use std::future::Future;

use serde::de::DeserializeOwned;

use crate::types::Error;

/// Factory for an authenticated connection to an object-store backend.
///
/// Implementations handle credential validation and client construction for
/// a specific provider. Connections are built once and shared.
pub trait Client: Sized + Send + Sync + 'static {
    /// Strongly-typed credentials for this provider.
    type Credentials: DeserializeOwned + Send + Sync;

    /// Unique identifier (e.g. "s3").
    const ID: &'static str;

    /// Create a connected client instance.
    fn connect(creds: &Self::Credentials) -> impl Future<Output = Result<Self, Error>> + Send;
}
