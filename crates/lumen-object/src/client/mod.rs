//! Unified object-store client backed by [`object_store::ObjectStore`].
//!
//! [`ObjectStoreClient`] is a thin, cloneable wrapper around
//! `Arc<dyn ObjectStore>` that exposes the operations image assets need:
//! a write carrying store-native headers, a header-only read, and delete.
//! Every public method is instrumented with [`tracing`].

use std::sync::Arc;

use bytes::Bytes;
use object_store::path::Path;
use object_store::{GetOptions, ObjectStore, PutMode, PutOptions, PutPayload};

use crate::types::{Error, ObjectHeaders, PutHeaders};

mod put_output;

pub use put_output::PutOutput;

/// Cloneable handle to any [`ObjectStore`] backend.
///
/// Holds no per-request state, so one handle is built per process and
/// shared by every task. All methods accept string keys and convert them to
/// [`object_store::path::Path`] internally.
#[derive(Clone, Debug)]
pub struct ObjectStoreClient(pub Arc<dyn ObjectStore>);

impl ObjectStoreClient {
    /// Wrap a concrete [`ObjectStore`] implementation.
    pub fn new(store: impl ObjectStore) -> Self {
        Self(Arc::new(store))
    }

    /// Verify that the backing store is reachable.
    ///
    /// Issues a HEAD for a probe key. A not-found response is treated as
    /// success (the bucket exists), any other error is propagated.
    #[tracing::instrument(name = "object.verify", skip(self))]
    pub async fn verify_reachable(&self) -> Result<(), Error> {
        let path = Path::from("_lumen_verify_probe");
        match self.0.head(&path).await {
            Ok(_) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload `data` to `key`, overwriting any existing object.
    ///
    /// Attributes and object tags carried by `headers` are written in the
    /// same request.
    #[tracing::instrument(
        name = "object.put",
        skip(self, data, headers),
        fields(size = data.len(), headers = headers.len())
    )]
    pub async fn put(
        &self,
        key: &str,
        data: Bytes,
        headers: PutHeaders,
    ) -> Result<PutOutput, Error> {
        let path = Path::from(key);
        let payload = PutPayload::from(data);
        let (attributes, tags) = headers.into_parts();
        let opts = PutOptions {
            mode: PutMode::Overwrite,
            attributes,
            tags,
            ..Default::default()
        };
        let result = self.0.put_opts(&path, payload, opts).await?;
        Ok(result.into())
    }

    /// Fetch the content length and headers stored at `key` without
    /// transferring the body.
    #[tracing::instrument(name = "object.head", skip(self))]
    pub async fn head(&self, key: &str) -> Result<ObjectHeaders, Error> {
        let path = Path::from(key);
        let opts = GetOptions {
            head: true,
            ..Default::default()
        };
        let result = self.0.get_opts(&path, opts).await?;
        Ok(ObjectHeaders::new(result.meta, &result.attributes))
    }

    /// Retrieve the raw bytes stored at `key`.
    #[tracing::instrument(name = "object.get", skip(self))]
    pub async fn get(&self, key: &str) -> Result<Bytes, Error> {
        let path = Path::from(key);
        let result = self.0.get(&path).await?;
        Ok(result.bytes().await?)
    }

    /// Delete the object at `key`.
    #[tracing::instrument(name = "object.delete", skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = Path::from(key);
        Ok(self.0.delete(&path).await?)
    }
}
