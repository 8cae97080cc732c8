//! Variant size tags and the fixed four-slot container keyed by them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// Size tag of one raster rendition of an asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VariantSize {
    /// The untouched source raster.
    Full,
    /// Small rendition, 360px long edge.
    Sm,
    /// Medium rendition, 720px long edge.
    Md,
    /// Large rendition, 1080px long edge.
    Lg,
}

impl VariantSize {
    /// Every size, in derivation order.
    pub const ALL: [VariantSize; 4] = [Self::Full, Self::Sm, Self::Md, Self::Lg];

    /// Target long-edge length in pixels, `None` for [`VariantSize::Full`].
    pub fn target_long_edge(&self) -> Option<u32> {
        match self {
            Self::Full => None,
            Self::Sm => Some(360),
            Self::Md => Some(720),
            Self::Lg => Some(1080),
        }
    }

    /// Returns the lowercase tag.
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Exactly one `T` per [`VariantSize`].
///
/// Serializes as a map keyed by the size tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Variants<T> {
    pub full: T,
    pub sm: T,
    pub md: T,
    pub lg: T,
}

impl<T> Variants<T> {
    /// Builds a set by calling `f` once per size, in derivation order.
    pub fn from_fn(mut f: impl FnMut(VariantSize) -> T) -> Self {
        Self {
            full: f(VariantSize::Full),
            sm: f(VariantSize::Sm),
            md: f(VariantSize::Md),
            lg: f(VariantSize::Lg),
        }
    }

    /// Returns the entry for `size`.
    pub fn get(&self, size: VariantSize) -> &T {
        match size {
            VariantSize::Full => &self.full,
            VariantSize::Sm => &self.sm,
            VariantSize::Md => &self.md,
            VariantSize::Lg => &self.lg,
        }
    }

    /// Returns the entry for `size` mutably.
    pub fn get_mut(&mut self, size: VariantSize) -> &mut T {
        match size {
            VariantSize::Full => &mut self.full,
            VariantSize::Sm => &mut self.sm,
            VariantSize::Md => &mut self.md,
            VariantSize::Lg => &mut self.lg,
        }
    }

    /// Iterates over `(size, entry)` pairs in derivation order.
    pub fn iter(&self) -> impl Iterator<Item = (VariantSize, &T)> {
        VariantSize::ALL.into_iter().map(move |size| (size, self.get(size)))
    }
}

impl<T> IntoIterator for Variants<T> {
    type Item = (VariantSize, T);
    type IntoIter = std::array::IntoIter<(VariantSize, T), 4>;

    fn into_iter(self) -> Self::IntoIter {
        [
            (VariantSize::Full, self.full),
            (VariantSize::Sm, self.sm),
            (VariantSize::Md, self.md),
            (VariantSize::Lg, self.lg),
        ]
        .into_iter()
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn size_tags_are_lowercase() {
        assert_eq!(VariantSize::Full.to_string(), "full");
        assert_eq!(VariantSize::Lg.as_str(), "lg");
        assert_eq!(VariantSize::from_str("md").unwrap(), VariantSize::Md);
        assert!(VariantSize::from_str("xl").is_err());
        assert!(VariantSize::from_str("SM").is_err());
    }

    #[test]
    fn derived_sizes_have_distinct_targets() {
        let targets: Vec<_> = VariantSize::ALL
            .iter()
            .filter_map(|s| s.target_long_edge())
            .collect();
        assert_eq!(targets, vec![360, 720, 1080]);
        assert_eq!(VariantSize::Full.target_long_edge(), None);
    }

    #[test]
    fn variants_keep_size_association() {
        let variants = Variants::from_fn(|size| size.as_str().len());
        assert_eq!(*variants.get(VariantSize::Full), 4);
        assert_eq!(*variants.get(VariantSize::Md), 2);

        let sizes: Vec<_> = Variants::from_fn(|size| size).into_iter().collect();
        assert_eq!(sizes.len(), 4);
        assert!(sizes.iter().all(|(size, tag)| size == tag));
    }

    #[test]
    fn variants_serialize_as_size_map() {
        let variants = Variants::from_fn(|size| size.target_long_edge().unwrap_or(0));
        let json = serde_json::to_value(variants).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"full": 0, "sm": 360, "md": 720, "lg": 1080})
        );
    }
}
