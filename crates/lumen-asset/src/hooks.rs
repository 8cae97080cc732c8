//! Caller-supplied customization points.
//!
//! Each hook is optional; an unset hook falls back to the engine's default
//! behavior. Hooks are plain synchronous closures and must not block.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{AssetConfig, AssetId, FilenameTransform, VariantDescriptor};

/// Extra store-native headers to attach to one variant write.
///
/// Well-known HTTP header names (`CacheControl`, `Cache-Control`,
/// `ContentDisposition`, ...) map to the store's dedicated headers; any
/// other name is written as user metadata.
pub type UploadParams = BTreeMap<String, String>;

/// Context passed to the [`AssetHooks::with_mint_id`] hook.
#[derive(Debug, Clone, Copy)]
pub struct MintContext<'a> {
    /// The identifier the engine would use by default.
    pub default_id: &'a AssetId,
    /// Filename of the upload as supplied by the caller.
    pub original_filename: &'a str,
}

/// Overrides the asset identifier, `None` keeps the default.
pub type MintIdFn = Arc<dyn Fn(MintContext<'_>) -> Option<String> + Send + Sync>;

/// Overrides a variant's source URL, `None` falls through to the default.
pub type SrcFn = Arc<dyn Fn(&AssetConfig, &VariantDescriptor) -> Option<String> + Send + Sync>;

/// Computes extra upload headers for one variant.
pub type UploadParamsFn = Arc<dyn Fn(&VariantDescriptor) -> UploadParams + Send + Sync>;

/// Optional hooks customizing naming, identifiers, URLs and uploads.
#[derive(Clone, Default)]
pub struct AssetHooks {
    pub(crate) transform_filename: Option<FilenameTransform>,
    pub(crate) mint_id: Option<MintIdFn>,
    pub(crate) get_src: Option<SrcFn>,
    pub(crate) upload_params: Option<UploadParamsFn>,
}

impl AssetHooks {
    /// Creates an empty hook set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the slug transform applied to the name part of uploads.
    #[must_use]
    pub fn with_transform_filename(
        mut self,
        transform: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.transform_filename = Some(Arc::new(transform));
        self
    }

    /// Overrides the identifier minted for each ingestion.
    #[must_use]
    pub fn with_mint_id(
        mut self,
        mint: impl Fn(MintContext<'_>) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.mint_id = Some(Arc::new(mint));
        self
    }

    /// Overrides the source URL of variants when no base URL is configured.
    #[must_use]
    pub fn with_get_src(
        mut self,
        get_src: impl Fn(&AssetConfig, &VariantDescriptor) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.get_src = Some(Arc::new(get_src));
        self
    }

    /// Adds extra headers to every variant write.
    #[must_use]
    pub fn with_upload_params(
        mut self,
        params: impl Fn(&VariantDescriptor) -> UploadParams + Send + Sync + 'static,
    ) -> Self {
        self.upload_params = Some(Arc::new(params));
        self
    }

    /// Mints the identifier for an ingestion of `original_filename`.
    pub(crate) fn mint(&self, original_filename: &str) -> crate::Result<AssetId> {
        let default_id = AssetId::mint();
        let Some(mint) = &self.mint_id else {
            return Ok(default_id);
        };

        let context = MintContext {
            default_id: &default_id,
            original_filename,
        };
        match mint(context) {
            Some(id) => AssetId::new(id),
            None => Ok(default_id),
        }
    }

    /// Returns the extra headers for `descriptor`.
    pub(crate) fn upload_params(&self, descriptor: &VariantDescriptor) -> UploadParams {
        self.upload_params
            .as_ref()
            .map(|params| params(descriptor))
            .unwrap_or_default()
    }
}

impl fmt::Debug for AssetHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetHooks")
            .field("transform_filename", &self.transform_filename.is_some())
            .field("mint_id", &self.mint_id.is_some())
            .field("get_src", &self.get_src.is_some())
            .field("upload_params", &self.upload_params.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn mint_defaults_without_hook() {
        let id = AssetHooks::new().mint("photo.jpg").unwrap();
        assert_eq!(id.as_str().len(), 32);
    }

    #[test]
    fn mint_hook_overrides_or_falls_through() {
        let hooks = AssetHooks::new().with_mint_id(|ctx| {
            ctx.original_filename
                .starts_with("avatar")
                .then(|| format!("avatar-{}", ctx.default_id))
        });

        let id = hooks.mint("avatar.png").unwrap();
        assert!(id.as_str().starts_with("avatar-"));

        let id = hooks.mint("photo.png").unwrap();
        assert!(!id.as_str().starts_with("avatar-"));
    }

    #[test]
    fn mint_hook_output_is_validated() {
        let hooks = AssetHooks::new().with_mint_id(|_| Some("bad/id".to_owned()));
        let err = hooks.mint("photo.png").unwrap_err();
        assert!(matches!(err, Error::InvalidAssetId { .. }));
    }
}
