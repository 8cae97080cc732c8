//! The asset engine: ingestion and resolution entry points.

use std::sync::Arc;

use lumen_image::{ImageFormat, VariantGenerator, VariantSize, Variants};
use lumen_object::client::ObjectStoreClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::cancel::until_cancelled;
use crate::reference::MAX_EXTENSION_LEN;
use crate::resolve::MetadataResolver;
use crate::src_url::source_url;
use crate::upload::AssetUploader;
use crate::{
    AssetConfig, AssetHooks, AssetInput, FilenameParts, FilenameSanitizer, ImageAsset, ImageRef,
    ImageUpload, Result, TRACING_TARGET_INGEST, VariantDescriptor,
};

/// Outcome of a successful ingestion.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedImage {
    /// Descriptors of the four stored variants.
    pub asset: ImageAsset,
    /// Reference to the full-size variant, for the caller to persist.
    pub reference: ImageRef,
    /// Storage-safe rendition of the upload filename.
    pub safe_filename: String,
    /// Filename as supplied by the caller.
    pub original_filename: String,
}

/// Ingests raw uploads and resolves references against one bucket.
///
/// Cheap to clone; clones share the store connection, configuration and
/// hooks. The engine keeps no per-asset state: every resolution is
/// rebuilt from the object store.
#[derive(Debug, Clone)]
pub struct AssetStore {
    client: ObjectStoreClient,
    config: Arc<AssetConfig>,
    hooks: AssetHooks,
    sanitizer: FilenameSanitizer,
    generator: VariantGenerator,
}

impl AssetStore {
    /// Creates an engine over `client` with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the configuration
    /// is unusable.
    pub fn new(client: ObjectStoreClient, config: AssetConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            client,
            generator: VariantGenerator::with_options(config.generator_options()),
            config: Arc::new(config),
            hooks: AssetHooks::default(),
            sanitizer: FilenameSanitizer::default(),
        })
    }

    /// Installs caller hooks.
    #[must_use]
    pub fn with_hooks(mut self, hooks: AssetHooks) -> Self {
        self.sanitizer = match &hooks.transform_filename {
            Some(transform) => FilenameSanitizer::new().with_transform(Arc::clone(transform)),
            None => FilenameSanitizer::new(),
        };
        self.hooks = hooks;
        self
    }

    /// Returns the object store client.
    pub fn client(&self) -> &ObjectStoreClient {
        &self.client
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    /// Ingests an upload. See [`AssetStore::ingest_with_cancel`].
    pub async fn ingest(&self, upload: ImageUpload) -> Result<IngestedImage> {
        self.ingest_with_cancel(upload, &CancellationToken::new())
            .await
    }

    /// Decodes an upload, derives its four variants and stores them.
    ///
    /// Variants are written one at a time in the order full, sm, md, lg.
    /// A failed or cancelled write aborts the ingestion; variants already
    /// written stay in the store and no reference is returned.
    ///
    /// # Errors
    ///
    /// - [`InvalidFilename`](crate::Error::InvalidFilename) before any bytes
    ///   are read;
    /// - [`SourceRead`](crate::Error::SourceRead) if the upload stream fails;
    /// - [`UploadTooLarge`](crate::Error::UploadTooLarge) if it exceeds the
    ///   configured limit;
    /// - [`UnsupportedImageFormat`](crate::Error::UnsupportedImageFormat) or
    ///   [`Encoding`](crate::Error::Encoding) if the variants cannot be
    ///   derived;
    /// - [`InvalidAssetId`](crate::Error::InvalidAssetId) if the mint hook
    ///   returns an unusable id;
    /// - [`StorageWrite`](crate::Error::StorageWrite) if a variant write
    ///   fails;
    /// - [`Cancelled`](crate::Error::Cancelled) if `cancel` fires.
    #[tracing::instrument(
        name = "asset.ingest",
        skip_all,
        fields(filename = %upload.filename())
    )]
    pub async fn ingest_with_cancel(
        &self,
        mut upload: ImageUpload,
        cancel: &CancellationToken,
    ) -> Result<IngestedImage> {
        let original_filename = upload.filename().to_owned();
        let parts = FilenameParts::split(&original_filename)?;
        let safe_filename = self.sanitizer.sanitize(&original_filename)?;

        let source = upload.read_all(cancel, self.config.max_upload_bytes).await?;
        let rendered = until_cancelled(cancel, self.generator.generate(source)).await??;

        let format = rendered.full.info.format;
        let extension = parts
            .extension_lowercase()
            .filter(|ext| ext.len() <= MAX_EXTENSION_LEN)
            .unwrap_or_else(|| default_extension(format).to_owned());
        let content_type = upload
            .content_type()
            .map_or_else(|| format.to_mime_type().to_owned(), str::to_owned);

        let id = self.hooks.mint(&original_filename)?;
        let reference = ImageRef::new(id, VariantSize::Full, extension)?;

        let descriptors = Variants::from_fn(|size| {
            let variant = rendered.get(size);
            VariantDescriptor::new(
                reference.with_size(size),
                variant.width(),
                variant.height(),
                variant.byte_size(),
            )
        });

        let uploader = AssetUploader::new(&self.client, &self.config, &self.hooks);
        for (size, variant) in rendered {
            let write = uploader.upload(
                descriptors.get(size),
                variant.data,
                &content_type,
                &original_filename,
            );
            until_cancelled(cancel, write).await??;
        }

        let asset = ImageAsset::new(descriptors)?;
        tracing::info!(
            target: TRACING_TARGET_INGEST,
            reference = %reference,
            safe_filename = %safe_filename,
            width = asset.full().width(),
            height = asset.full().height(),
            "image ingested"
        );

        Ok(IngestedImage {
            asset,
            reference,
            safe_filename,
            original_filename,
        })
    }

    /// Resolves a reference. See [`AssetStore::resolve_with_cancel`].
    pub async fn resolve(&self, reference: &str) -> Result<ImageAsset> {
        self.resolve_with_cancel(reference, &CancellationToken::new())
            .await
    }

    /// Decodes `reference` and rebuilds the asset's composite descriptor
    /// from the object store.
    ///
    /// # Errors
    ///
    /// - [`InvalidReference`](crate::Error::InvalidReference) if `reference`
    ///   does not decode;
    /// - [`AssetVariantNotFound`](crate::Error::AssetVariantNotFound) if the
    ///   designated variant is missing;
    /// - [`StorageRead`](crate::Error::StorageRead) if a lookup fails;
    /// - [`Cancelled`](crate::Error::Cancelled) if `cancel` fires.
    #[tracing::instrument(name = "asset.resolve", skip(self, cancel))]
    pub async fn resolve_with_cancel(
        &self,
        reference: &str,
        cancel: &CancellationToken,
    ) -> Result<ImageAsset> {
        let reference = ImageRef::decode(reference)?;
        MetadataResolver::new(&self.client, &self.config)
            .resolve(&reference, cancel)
            .await
    }

    /// Ingests or resolves, depending on which input the caller supplied.
    pub async fn process(
        &self,
        input: AssetInput,
        cancel: &CancellationToken,
    ) -> Result<ImageAsset> {
        match input {
            AssetInput::Upload(upload) => Ok(self.ingest_with_cancel(upload, cancel).await?.asset),
            AssetInput::Ref(reference) => self.resolve_with_cancel(&reference, cancel).await,
        }
    }

    /// Returns the public URL of a stored variant.
    pub fn source_url(&self, descriptor: &VariantDescriptor) -> String {
        source_url(&self.config, &self.hooks, descriptor)
    }

    /// Returns the public URLs of all four variants of `asset`.
    pub fn source_urls(&self, asset: &ImageAsset) -> Variants<String> {
        Variants::from_fn(|size| self.source_url(asset.variant(size)))
    }
}

/// Canonical extension for `format`.
fn default_extension(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("bin")
}
