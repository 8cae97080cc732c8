//! Result type for [`ObjectStoreClient::put`](super::ObjectStoreClient::put).

/// Result of a successful put operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutOutput {
    /// Entity tag of the newly written object, if the backend provides one.
    pub e_tag: Option<String>,
    /// Version of the newly written object, if the backend provides one.
    pub version: Option<String>,
}

impl From<object_store::PutResult> for PutOutput {
    fn from(r: object_store::PutResult) -> Self {
        Self {
            e_tag: r.e_tag,
            version: r.version,
        }
    }
}
