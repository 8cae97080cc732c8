//! Variant descriptors and the composite image asset.

use lumen_image::{VariantSize, Variants};
use serde::{Deserialize, Serialize};

use crate::{AssetId, Error, ImageRef, Result};

/// Record describing one stored variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "DescriptorRepr", try_from = "DescriptorRepr")]
pub struct VariantDescriptor {
    reference: ImageRef,
    height: u32,
    width: u32,
    filesize: u64,
}

impl VariantDescriptor {
    /// Creates a descriptor for the variant `reference` designates.
    pub fn new(reference: ImageRef, width: u32, height: u32, filesize: u64) -> Self {
        Self {
            reference,
            height,
            width,
            filesize,
        }
    }

    /// Creates the zeroed placeholder for a variant missing from storage.
    pub fn degraded(reference: ImageRef) -> Self {
        Self::new(reference, 0, 0, 0)
    }

    /// Returns `true` if this is a placeholder for a missing variant.
    pub fn is_degraded(&self) -> bool {
        self.width == 0 && self.height == 0 && self.filesize == 0
    }

    /// Returns the reference designating this variant.
    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }

    /// Returns the asset identifier.
    pub fn id(&self) -> &AssetId {
        self.reference.id()
    }

    /// Returns the size tag.
    pub fn size(&self) -> VariantSize {
        self.reference.size()
    }

    /// Returns the file extension, without the leading dot.
    pub fn extension(&self) -> &str {
        self.reference.extension()
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Stored size in bytes.
    pub fn filesize(&self) -> u64 {
        self.filesize
    }

    /// Returns the variant filename, `{id}_{size}.{ext}`.
    pub fn filename(&self) -> String {
        self.reference.filename()
    }
}

#[derive(Serialize, Deserialize)]
struct DescriptorRepr {
    id: AssetId,
    size: VariantSize,
    extension: String,
    height: u32,
    width: u32,
    filesize: u64,
}

impl From<VariantDescriptor> for DescriptorRepr {
    fn from(descriptor: VariantDescriptor) -> Self {
        Self {
            id: descriptor.reference.id().clone(),
            size: descriptor.reference.size(),
            extension: descriptor.reference.extension().to_owned(),
            height: descriptor.height,
            width: descriptor.width,
            filesize: descriptor.filesize,
        }
    }
}

impl TryFrom<DescriptorRepr> for VariantDescriptor {
    type Error = Error;

    fn try_from(repr: DescriptorRepr) -> Result<Self> {
        let reference = ImageRef::new(repr.id, repr.size, repr.extension)?;
        Ok(Self::new(reference, repr.width, repr.height, repr.filesize))
    }
}

/// The full-size descriptor of an image plus all four variants.
///
/// Serializes as the full-size descriptor's fields with a `sizesMeta`
/// map keyed by size tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAsset {
    #[serde(flatten)]
    image: VariantDescriptor,
    sizes_meta: Variants<VariantDescriptor>,
}

impl ImageAsset {
    /// Assembles an asset from one descriptor per size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if a descriptor sits in the slot
    /// of another size or belongs to another asset.
    pub fn new(variants: Variants<VariantDescriptor>) -> Result<Self> {
        let full = variants.full.reference();
        for (size, descriptor) in variants.iter() {
            let consistent = descriptor.size() == size
                && descriptor.id() == full.id()
                && descriptor.extension() == full.extension();
            if !consistent {
                return Err(Error::InvalidReference(descriptor.reference().encode()));
            }
        }

        Ok(Self {
            image: variants.full.clone(),
            sizes_meta: variants,
        })
    }

    /// Returns the full-size descriptor.
    pub fn full(&self) -> &VariantDescriptor {
        &self.image
    }

    /// Returns the descriptor of `size`.
    pub fn variant(&self, size: VariantSize) -> &VariantDescriptor {
        self.sizes_meta.get(size)
    }

    /// Returns all four descriptors.
    pub fn variants(&self) -> &Variants<VariantDescriptor> {
        &self.sizes_meta
    }

    /// Returns the reference to the full-size variant.
    pub fn reference(&self) -> &ImageRef {
        self.image.reference()
    }

    /// Returns the sizes that resolved to placeholders.
    pub fn degraded_sizes(&self) -> Vec<VariantSize> {
        self.sizes_meta
            .iter()
            .filter(|(_, descriptor)| descriptor.is_degraded())
            .map(|(size, _)| size)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn reference(size: VariantSize) -> ImageRef {
        ImageRef::new(AssetId::new("abc123").unwrap(), size, "jpg").unwrap()
    }

    fn asset() -> ImageAsset {
        ImageAsset::new(Variants::from_fn(|size| {
            let edge = size.target_long_edge().unwrap_or(1600);
            VariantDescriptor::new(reference(size), edge, edge * 3 / 4, u64::from(edge) * 10)
        }))
        .unwrap()
    }

    #[test]
    fn descriptor_serializes_flat() {
        let descriptor = VariantDescriptor::new(reference(VariantSize::Sm), 360, 270, 1234);
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            json,
            json!({
                "id": "abc123",
                "size": "sm",
                "extension": "jpg",
                "height": 270,
                "width": 360,
                "filesize": 1234,
            })
        );

        let back: VariantDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(back, descriptor);
    }

    #[test]
    fn asset_serializes_full_fields_and_sizes_meta() {
        let json = serde_json::to_value(asset()).unwrap();

        assert_eq!(json["id"], "abc123");
        assert_eq!(json["size"], "full");
        assert_eq!(json["width"], 1600);
        assert_eq!(json["sizesMeta"]["full"]["width"], 1600);
        assert_eq!(json["sizesMeta"]["lg"]["size"], "lg");
        assert_eq!(json["sizesMeta"]["md"]["height"], 540);
        assert_eq!(json["sizesMeta"].as_object().unwrap().len(), 4);
    }

    #[test]
    fn rejects_mislabelled_slots() {
        let mut variants = asset().variants().clone();
        variants.lg = variants.md.clone();
        let err = ImageAsset::new(variants).unwrap_err();
        assert!(matches!(err, Error::InvalidReference(_)));
    }

    #[test]
    fn reports_degraded_sizes() {
        let mut variants = asset().variants().clone();
        variants.lg = VariantDescriptor::degraded(reference(VariantSize::Lg));
        let asset = ImageAsset::new(variants).unwrap();

        assert_eq!(asset.degraded_sizes(), vec![VariantSize::Lg]);
        assert_eq!(asset.reference().encode(), "image:abc123_full.jpg");
        assert_eq!(asset.variant(VariantSize::Lg).filesize(), 0);
    }
}
