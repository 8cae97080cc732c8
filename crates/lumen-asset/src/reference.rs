//! Image references and storage keys.
//!
//! A reference is the opaque string callers persist to point at one
//! variant of an ingested image:
//!
//! ```text
//! image:{id}_{size}.{ext}
//! ```
//!
//! Everything after the `image:` prefix doubles as the variant's filename
//! inside the configured storage folder, so a reference always maps back
//! to exactly one storage key.

use std::fmt;
use std::str::FromStr;

use lumen_image::VariantSize;
use serde::{Deserialize, Serialize};

use crate::{AssetId, Error, Result};

/// Prefix every encoded reference starts with.
pub const REFERENCE_PREFIX: &str = "image:";

/// Maximum length of a variant file extension.
pub(crate) const MAX_EXTENSION_LEN: usize = 16;

/// Pointer to one variant of an ingested image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef {
    id: AssetId,
    size: VariantSize,
    extension: String,
}

impl ImageRef {
    /// Creates a reference from its parts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] if `extension` is empty, longer
    /// than 16 characters, or not made of ASCII letters.
    pub fn new(id: AssetId, size: VariantSize, extension: impl Into<String>) -> Result<Self> {
        let extension = extension.into();
        if !is_valid_extension(&extension) {
            return Err(Error::InvalidReference(format!(
                "{REFERENCE_PREFIX}{id}_{size}.{extension}"
            )));
        }

        Ok(Self {
            id,
            size,
            extension,
        })
    }

    /// Decodes an `image:{id}_{size}.{ext}` string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidReference`] for any string that does not
    /// follow the format, including unknown size tags.
    pub fn decode(reference: &str) -> Result<Self> {
        let invalid = || Error::InvalidReference(reference.to_owned());

        let filename = reference.strip_prefix(REFERENCE_PREFIX).ok_or_else(invalid)?;
        let (stem, extension) = filename.rsplit_once('.').ok_or_else(invalid)?;
        let (id, size) = stem.rsplit_once('_').ok_or_else(invalid)?;

        let size = VariantSize::from_str(size).map_err(|_| invalid())?;
        let id = AssetId::new(id).map_err(|_| invalid())?;
        if !is_valid_extension(extension) {
            return Err(invalid());
        }

        Ok(Self {
            id,
            size,
            extension: extension.to_owned(),
        })
    }

    /// Encodes the reference as `image:{id}_{size}.{ext}`.
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Returns the asset identifier.
    pub fn id(&self) -> &AssetId {
        &self.id
    }

    /// Returns the designated size.
    pub fn size(&self) -> VariantSize {
        self.size
    }

    /// Returns the file extension, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Returns the same asset's reference for another size.
    #[must_use]
    pub fn with_size(&self, size: VariantSize) -> Self {
        Self {
            id: self.id.clone(),
            size,
            extension: self.extension.clone(),
        }
    }

    /// Returns the variant filename, `{id}_{size}.{ext}`.
    pub fn filename(&self) -> String {
        format!("{}_{}.{}", self.id, self.size, self.extension)
    }

    /// Returns the storage key of the variant inside `folder`.
    ///
    /// Leading and trailing slashes on `folder` are ignored; an empty
    /// folder places the variant at the bucket root.
    pub fn storage_key(&self, folder: &str) -> String {
        let folder = folder.trim_matches('/');
        if folder.is_empty() {
            self.filename()
        } else {
            format!("{folder}/{}", self.filename())
        }
    }
}

fn is_valid_extension(extension: &str) -> bool {
    !extension.is_empty()
        && extension.len() <= MAX_EXTENSION_LEN
        && extension.bytes().all(|b| b.is_ascii_alphabetic())
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{REFERENCE_PREFIX}{}", self.filename())
    }
}

impl FromStr for ImageRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::decode(s)
    }
}

impl TryFrom<String> for ImageRef {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::decode(&value)
    }
}

impl From<ImageRef> for String {
    fn from(reference: ImageRef) -> Self {
        reference.encode()
    }
}
