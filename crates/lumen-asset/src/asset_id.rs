//! Asset identifiers.

use std::str::FromStr;

use derive_more::{AsRef, Display};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum length of an asset identifier.
pub const MAX_ASSET_ID_LEN: usize = 128;

/// Identifier shared by all four variants of one ingested image.
///
/// Restricted to ASCII letters, digits, `-` and `_` so it can be embedded
/// in storage keys, URLs and references without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Display, AsRef, Serialize, Deserialize)]
#[as_ref(str)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    /// Validates `id` as an asset identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAssetId`] if `id` is empty, too long, or
    /// contains anything other than ASCII letters, digits, `-` and `_`.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        let reason = if id.is_empty() {
            Some("must not be empty")
        } else if id.len() > MAX_ASSET_ID_LEN {
            Some("must be at most 128 characters")
        } else if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_') {
            Some("must contain only ASCII letters, digits, '-' and '_'")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(Error::InvalidAssetId { id, reason }),
            None => Ok(Self(id)),
        }
    }

    /// Mints a fresh identifier.
    ///
    /// Identifiers are time-ordered, so keys of recently ingested assets
    /// sort together in bucket listings.
    pub fn mint() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for AssetId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for AssetId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}
