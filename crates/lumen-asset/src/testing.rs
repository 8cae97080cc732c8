//! Fixtures shared by the crate's tests.

use std::fmt;
use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lumen_object::client::ObjectStoreClient;
use object_store::memory::InMemory;
use object_store::path::Path;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore,
    PutMultipartOpts, PutOptions, PutPayload, PutResult,
};
use url::form_urlencoded;

use crate::{AssetConfig, AssetStore};

fn encode(image: DynamicImage, format: ImageFormat) -> Bytes {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    Bytes::from(buf)
}

/// A `width`x`height` JPEG with a gradient body.
pub fn jpeg(width: u32, height: u32) -> Bytes {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    encode(DynamicImage::ImageRgb8(image), ImageFormat::Jpeg)
}

/// A `width`x`height` translucent PNG.
pub fn png(width: u32, height: u32) -> Bytes {
    let image = RgbaImage::from_pixel(width, height, Rgba([200, 40, 90, 160]));
    encode(DynamicImage::ImageRgba8(image), ImageFormat::Png)
}

/// An engine over `store`, plus a client on the same store.
pub fn store_over(config: AssetConfig, store: impl ObjectStore) -> (AssetStore, ObjectStoreClient) {
    let client = ObjectStoreClient::new(store);
    let engine = AssetStore::new(client.clone(), config).unwrap();
    (engine, client)
}

/// An engine over a fresh in-memory store, plus a client on the same store.
pub fn memory_store(config: AssetConfig) -> (AssetStore, ObjectStoreClient) {
    store_over(config, InMemory::new())
}

/// Number of objects currently in the store.
pub async fn object_count(client: &ObjectStoreClient) -> usize {
    client.0.list(None).count().await
}

/// Decodes a value written by [`crate::upload::encode_header_value`].
pub fn decode_header_value(value: &str) -> String {
    form_urlencoded::parse(value.as_bytes())
        .next()
        .map(|(decoded, _)| decoded.into_owned())
        .unwrap_or_default()
}

/// In-memory store that rejects writes or header reads on chosen keys.
///
/// A key is affected when it contains one of the registered patterns.
/// Rejected writes fail like a throttled backend (retryable); rejected
/// header reads fail with a permission error.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: InMemory,
    failing_puts: Vec<&'static str>,
    failing_heads: Vec<&'static str>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects writes to keys containing `pattern`.
    pub fn fail_puts(mut self, pattern: &'static str) -> Self {
        self.failing_puts.push(pattern);
        self
    }

    /// Rejects header-only reads of keys containing `pattern`.
    pub fn fail_heads(mut self, pattern: &'static str) -> Self {
        self.failing_heads.push(pattern);
        self
    }

    fn hits(patterns: &[&str], location: &Path) -> bool {
        let key: &str = location.as_ref();
        patterns.iter().any(|pattern| key.contains(pattern))
    }
}

impl fmt::Display for FaultyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FaultyStore({})", self.inner)
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_opts(
        &self,
        location: &Path,
        payload: PutPayload,
        opts: PutOptions,
    ) -> object_store::Result<PutResult> {
        if Self::hits(&self.failing_puts, location) {
            return Err(object_store::Error::Generic {
                store: "FaultyStore",
                source: format!("write to {location} rejected").into(),
            });
        }
        self.inner.put_opts(location, payload, opts).await
    }

    async fn put_multipart_opts(
        &self,
        location: &Path,
        opts: PutMultipartOpts,
    ) -> object_store::Result<Box<dyn MultipartUpload>> {
        self.inner.put_multipart_opts(location, opts).await
    }

    async fn get_opts(
        &self,
        location: &Path,
        options: GetOptions,
    ) -> object_store::Result<GetResult> {
        if options.head && Self::hits(&self.failing_heads, location) {
            return Err(object_store::Error::PermissionDenied {
                path: location.to_string(),
                source: "header read rejected".into(),
            });
        }
        self.inner.get_opts(location, options).await
    }

    async fn delete(&self, location: &Path) -> object_store::Result<()> {
        self.inner.delete(location).await
    }

    fn list(&self, prefix: Option<&Path>) -> BoxStream<'static, object_store::Result<ObjectMeta>> {
        self.inner.list(prefix)
    }

    async fn list_with_delimiter(&self, prefix: Option<&Path>) -> object_store::Result<ListResult> {
        self.inner.list_with_delimiter(prefix).await
    }

    async fn copy(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy(from, to).await
    }

    async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> object_store::Result<()> {
        self.inner.copy_if_not_exists(from, to).await
    }
}
