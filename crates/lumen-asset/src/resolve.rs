//! Reconstructs composite descriptors from stored headers.

use futures::future::try_join_all;
use lumen_image::{VariantSize, Variants};
use lumen_object::client::ObjectStoreClient;
use lumen_object::types::ObjectHeaders;
use tokio_util::sync::CancellationToken;

use crate::cancel::until_cancelled;
use crate::upload::{META_IMAGE_HEIGHT, META_IMAGE_WIDTH};
use crate::{
    AssetConfig, Error, ImageAsset, ImageRef, Result, TRACING_TARGET_RESOLVE, VariantDescriptor,
};

/// Reads variant headers back from the object store.
#[derive(Debug, Clone, Copy)]
pub struct MetadataResolver<'a> {
    client: &'a ObjectStoreClient,
    config: &'a AssetConfig,
}

impl<'a> MetadataResolver<'a> {
    /// Creates a resolver reading from `config`'s folder.
    pub fn new(client: &'a ObjectStoreClient, config: &'a AssetConfig) -> Self {
        Self { client, config }
    }

    /// Assembles the composite descriptor of the asset `reference` points
    /// to.
    ///
    /// The requested size is looked up first. The remaining three sizes are
    /// then looked up concurrently; any of them missing from the store
    /// resolves to a zeroed placeholder instead of failing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AssetVariantNotFound`] if the requested size is
    /// missing, [`Error::StorageRead`] if any lookup fails for another
    /// reason, and [`Error::Cancelled`] if `cancel` fires.
    pub async fn resolve(
        &self,
        reference: &ImageRef,
        cancel: &CancellationToken,
    ) -> Result<ImageAsset> {
        let requested = reference.size();
        let Some(descriptor) = self.lookup(reference, cancel).await? else {
            return Err(Error::AssetVariantNotFound {
                key: reference.storage_key(self.config.folder()),
                size: requested,
            });
        };

        let others = VariantSize::ALL
            .into_iter()
            .filter(|size| *size != requested)
            .map(|size| self.lookup_or_degrade(reference.with_size(size), cancel));
        let others = try_join_all(others).await?;

        let mut variants = Variants::from_fn(|size| {
            VariantDescriptor::degraded(reference.with_size(size))
        });
        for descriptor in others.into_iter().chain([descriptor]) {
            let size = descriptor.size();
            *variants.get_mut(size) = descriptor;
        }

        let asset = ImageAsset::new(variants)?;
        tracing::debug!(
            target: TRACING_TARGET_RESOLVE,
            reference = %reference,
            degraded = ?asset.degraded_sizes(),
            "asset resolved"
        );

        Ok(asset)
    }

    async fn lookup_or_degrade(
        &self,
        reference: ImageRef,
        cancel: &CancellationToken,
    ) -> Result<VariantDescriptor> {
        if let Some(descriptor) = self.lookup(&reference, cancel).await? {
            return Ok(descriptor);
        }

        tracing::warn!(
            target: TRACING_TARGET_RESOLVE,
            key = %reference.storage_key(self.config.folder()),
            size = %reference.size(),
            "variant missing from storage, degrading"
        );
        Ok(VariantDescriptor::degraded(reference))
    }

    /// Looks up one variant, `None` if no object exists at its key.
    async fn lookup(
        &self,
        reference: &ImageRef,
        cancel: &CancellationToken,
    ) -> Result<Option<VariantDescriptor>> {
        let key = reference.storage_key(self.config.folder());
        let headers = match until_cancelled(cancel, self.client.head(&key)).await? {
            Ok(headers) => headers,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(Error::storage_read(key, e)),
        };

        let width = dimension(&headers, META_IMAGE_WIDTH);
        let height = dimension(&headers, META_IMAGE_HEIGHT);
        Ok(Some(VariantDescriptor::new(
            reference.clone(),
            width,
            height,
            headers.size,
        )))
    }
}

/// Prefix some writers leave on user metadata keys.
const AMZ_META_PREFIX: &str = "x-amz-meta-";

/// Parses a dimension header, zero if absent or malformed.
///
/// Falls back to the `x-amz-meta-` prefixed key for objects whose writer
/// stored the prefix as part of the key.
fn dimension(headers: &ObjectHeaders, name: &str) -> u32 {
    let value = headers
        .metadata(name)
        .or_else(|| headers.metadata(&format!("{AMZ_META_PREFIX}{name}")));
    let Some(value) = value else {
        return 0;
    };

    value.trim().parse().unwrap_or_else(|_| {
        tracing::warn!(
            target: TRACING_TARGET_RESOLVE,
            key = %headers.key,
            header = name,
            value,
            "malformed dimension header"
        );
        0
    })
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use lumen_object::types::PutHeaders;
    use object_store::memory::InMemory;

    use super::*;
    use crate::testing::FaultyStore;

    async fn put(client: &ObjectStoreClient, key: &str, width: &str, height: &str) {
        let headers = PutHeaders::new()
            .with_content_type("image/jpeg")
            .with_metadata(META_IMAGE_WIDTH, width)
            .with_metadata(META_IMAGE_HEIGHT, height);
        client.put(key, Bytes::from("0123456789"), headers).await.unwrap();
    }

    fn fixture() -> (ObjectStoreClient, AssetConfig) {
        (ObjectStoreClient::new(InMemory::new()), AssetConfig::new("photos"))
    }

    #[tokio::test]
    async fn resolves_all_sizes() {
        let (client, config) = fixture();
        put(&client, "images/abc_full.jpg", "1600", "1200").await;
        put(&client, "images/abc_sm.jpg", "360", "270").await;
        put(&client, "images/abc_md.jpg", "720", "540").await;
        put(&client, "images/abc_lg.jpg", "1080", "810").await;

        let reference = ImageRef::decode("image:abc_sm.jpg").unwrap();
        let asset = MetadataResolver::new(&client, &config)
            .resolve(&reference, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(asset.full().width(), 1600);
        assert_eq!(asset.full().filesize(), 10);
        assert_eq!(asset.variant(VariantSize::Lg).height(), 810);
        assert_eq!(asset.variant(VariantSize::Md).size(), VariantSize::Md);
        assert!(asset.degraded_sizes().is_empty());
    }

    #[tokio::test]
    async fn missing_requested_size_fails() {
        let (client, config) = fixture();
        put(&client, "images/abc_full.jpg", "1600", "1200").await;

        let reference = ImageRef::decode("image:abc_md.jpg").unwrap();
        let err = MetadataResolver::new(&client, &config)
            .resolve(&reference, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::AssetVariantNotFound { ref key, size: VariantSize::Md } if key == "images/abc_md.jpg"
        ));
    }

    #[tokio::test]
    async fn malformed_headers_read_as_zero() {
        let (client, config) = fixture();
        put(&client, "images/abc_full.jpg", "wide", "").await;

        let reference = ImageRef::decode("image:abc_full.jpg").unwrap();
        let asset = MetadataResolver::new(&client, &config)
            .resolve(&reference, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!((asset.full().width(), asset.full().height()), (0, 0));
        assert_eq!(asset.full().filesize(), 10);
        assert_eq!(asset.degraded_sizes().len(), 3);
    }

    #[tokio::test]
    async fn prefixed_dimension_keys_are_read() {
        let (client, config) = fixture();
        let headers = PutHeaders::new()
            .with_metadata("x-amz-meta-image-width", "640")
            .with_metadata("x-amz-meta-image-height", "480");
        client
            .put("images/abc_full.jpg", Bytes::from("0123"), headers)
            .await
            .unwrap();

        let reference = ImageRef::decode("image:abc_full.jpg").unwrap();
        let asset = MetadataResolver::new(&client, &config)
            .resolve(&reference, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!((asset.full().width(), asset.full().height()), (640, 480));
    }

    #[tokio::test]
    async fn failed_read_of_requested_size_is_not_a_miss() {
        let client = ObjectStoreClient::new(FaultyStore::new().fail_heads("_full."));
        let config = AssetConfig::new("photos");
        put(&client, "images/abc_full.jpg", "1600", "1200").await;

        let reference = ImageRef::decode("image:abc_full.jpg").unwrap();
        let err = MetadataResolver::new(&client, &config)
            .resolve(&reference, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::StorageRead { ref key, .. } if key == "images/abc_full.jpg"
        ));
    }

    #[tokio::test]
    async fn cancelled_resolution_stops() {
        let (client, config) = fixture();
        put(&client, "images/abc_full.jpg", "1600", "1200").await;

        let cancel = CancellationToken::new();
        cancel.cancel();
        let reference = ImageRef::decode("image:abc_full.jpg").unwrap();
        let err = MetadataResolver::new(&client, &config)
            .resolve(&reference, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
    }
}
