//! Public URL resolution for stored variants.

use crate::{AssetConfig, AssetHooks, VariantDescriptor};

/// Computes the public URL of `descriptor`.
///
/// In order of precedence:
///
/// 1. `base_url` from the configuration, with the variant filename
///    appended;
/// 2. the [`AssetHooks::with_get_src`] hook, if it returns a URL;
/// 3. the bucket's public endpoint, followed by the folder and the
///    variant filename.
pub fn source_url(
    config: &AssetConfig,
    hooks: &AssetHooks,
    descriptor: &VariantDescriptor,
) -> String {
    let filename = descriptor.filename();

    if let Some(base_url) = &config.base_url {
        return join_url(base_url.as_str(), &[&filename]);
    }

    let hooked = hooks.get_src.as_ref().and_then(|get_src| get_src(config, descriptor));
    if let Some(src) = hooked {
        return src;
    }

    join_url(&config.public_endpoint(), &[config.folder(), &filename])
}

/// Joins URL segments with exactly one `/` between them.
///
/// Empty segments are skipped, so an empty folder yields no doubled slash.
pub fn join_url(base: &str, segments: &[&str]) -> String {
    let mut url = base.trim_end_matches('/').to_owned();
    for segment in segments {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            continue;
        }
        url.push('/');
        url.push_str(segment);
    }
    url
}
