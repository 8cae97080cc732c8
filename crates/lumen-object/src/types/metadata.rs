//! Store-native headers attached on write and read back on header-only fetch.

use std::collections::BTreeMap;

use object_store::{Attribute, Attributes, ObjectMeta, TagSet};
use url::form_urlencoded;

use crate::TRACING_TARGET_CLIENT;

/// Headers sent along with a single object write.
///
/// Wraps [`object_store::Attributes`]. Well-known HTTP header names map to
/// their dedicated attribute, `Tagging` maps to object tags, and every
/// other name becomes user metadata (`x-amz-meta-*` on S3). Request-level
/// S3 parameters that have no per-object counterpart are dropped with a
/// warning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutHeaders {
    attributes: Attributes,
    tags: Vec<(String, String)>,
}

impl PutHeaders {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the `Content-Type` header.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        let value: String = content_type.into();
        self.attributes.insert(Attribute::ContentType, value.into());
        self
    }

    /// Adds a user metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let (key, value): (String, String) = (key.into(), value.into());
        self.attributes
            .insert(Attribute::Metadata(key.into()), value.into());
        self
    }

    /// Sets a header by name, replacing any previous value for the same
    /// target.
    ///
    /// Names are matched case-insensitively, with or without dashes.
    /// `CacheControl`, `ContentDisposition`, `ContentEncoding`,
    /// `ContentLanguage` and `ContentType` set the matching attribute.
    /// `Tagging` takes a form-encoded `key=value&...` tag set. Request
    /// parameters such as `ACL` or `StorageClass` are ignored. Anything
    /// else is stored as user metadata.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value: String = value.into();
        match HeaderTarget::classify(name) {
            HeaderTarget::Attribute(attribute) => {
                self.attributes.insert(attribute, value.into());
            }
            HeaderTarget::Tagging => {
                self.tags = form_urlencoded::parse(value.as_bytes())
                    .into_owned()
                    .collect();
            }
            HeaderTarget::Request => {
                tracing::warn!(
                    target: TRACING_TARGET_CLIENT,
                    header = name,
                    "request parameter has no per-object mapping, ignoring"
                );
            }
            HeaderTarget::Metadata => {
                self.attributes
                    .insert(Attribute::Metadata(name.to_owned().into()), value.into());
            }
        }
        self
    }

    /// Returns the value of the `Content-Type` header, if set.
    pub fn content_type(&self) -> Option<String> {
        self.attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string())
    }

    /// Returns the value of a user metadata entry, if set.
    pub fn metadata(&self, key: &str) -> Option<String> {
        self.attributes
            .get(&Attribute::Metadata(key.to_owned().into()))
            .map(|v| v.to_string())
    }

    /// Returns the object tags, in the order they were given.
    pub fn tags(&self) -> &[(String, String)] {
        &self.tags
    }

    /// Returns the number of headers, counting each tag.
    pub fn len(&self) -> usize {
        self.attributes.len() + self.tags.len()
    }

    /// Returns `true` if no header is set.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_parts(self) -> (Attributes, TagSet) {
        let mut tags = TagSet::default();
        for (key, value) in &self.tags {
            tags.push(key, value);
        }
        (self.attributes, tags)
    }
}

/// Where a named header lands on the write request.
enum HeaderTarget {
    Attribute(Attribute),
    Tagging,
    Request,
    Metadata,
}

impl HeaderTarget {
    fn classify(name: &str) -> Self {
        let normalized: String = name
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let normalized = normalized.strip_prefix("xamz").unwrap_or(&normalized);

        match normalized {
            "cachecontrol" => Self::Attribute(Attribute::CacheControl),
            "contentdisposition" => Self::Attribute(Attribute::ContentDisposition),
            "contentencoding" => Self::Attribute(Attribute::ContentEncoding),
            "contentlanguage" => Self::Attribute(Attribute::ContentLanguage),
            "contenttype" => Self::Attribute(Attribute::ContentType),
            "tagging" => Self::Tagging,
            "acl"
            | "bucket"
            | "key"
            | "body"
            | "contentlength"
            | "contentmd5"
            | "checksumalgorithm"
            | "storageclass"
            | "serversideencryption"
            | "ssekmskeyid"
            | "bucketkeyenabled"
            | "grantfullcontrol"
            | "grantread"
            | "grantreadacp"
            | "grantwriteacp"
            | "objectlockmode"
            | "objectlockretainuntildate"
            | "objectlocklegalholdstatus"
            | "expectedbucketowner"
            | "requestpayer"
            | "websiteredirectlocation" => Self::Request,
            _ => Self::Metadata,
        }
    }
}

/// Result of a header-only fetch: everything the store knows about an
/// object except its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectHeaders {
    /// Key the headers were fetched for.
    pub key: String,
    /// Content length reported by the store.
    pub size: u64,
    /// MIME content-type, if the backend provides one.
    pub content_type: Option<String>,
    /// Entity tag, if the backend provides one.
    pub e_tag: Option<String>,
    /// User metadata entries.
    pub metadata: BTreeMap<String, String>,
}

impl ObjectHeaders {
    pub(crate) fn new(meta: ObjectMeta, attributes: &Attributes) -> Self {
        let mut content_type = None;
        let mut metadata = BTreeMap::new();

        for (attribute, value) in attributes.iter() {
            match attribute {
                Attribute::ContentType => content_type = Some(value.to_string()),
                Attribute::Metadata(key) => {
                    metadata.insert(key.to_string(), value.to_string());
                }
                _ => {}
            }
        }

        Self {
            key: meta.location.to_string(),
            size: meta.size,
            content_type,
            e_tag: meta.e_tag,
            metadata,
        }
    }

    /// Returns the value of a user metadata entry, if present.
    pub fn metadata(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_known_names_map_to_attributes() {
        let headers = PutHeaders::new()
            .with_header("Cache-Control", "max-age=60")
            .with_header("ContentType", "image/png");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.content_type().as_deref(), Some("image/png"));
        assert_eq!(headers.metadata("Cache-Control"), None);
    }

    #[test]
    fn unknown_names_become_metadata() {
        let headers = PutHeaders::new().with_header("x-tenant", "acme");
        assert_eq!(headers.metadata("x-tenant").as_deref(), Some("acme"));
    }

    #[test]
    fn tagging_becomes_object_tags() {
        let headers = PutHeaders::new()
            .with_header("Tagging", "team=media&tier=hot%20path")
            .with_metadata("image-width", "10");

        assert_eq!(
            headers.tags(),
            [
                ("team".to_owned(), "media".to_owned()),
                ("tier".to_owned(), "hot path".to_owned()),
            ]
        );
        assert_eq!(headers.metadata("Tagging"), None);
        assert_eq!(headers.len(), 3);

        let (attributes, tags) = headers.into_parts();
        assert_eq!(attributes.len(), 1);
        assert!(tags.encoded().starts_with("team=media&tier=hot"));
    }

    #[test]
    fn request_parameters_are_not_stored() {
        let headers = PutHeaders::new()
            .with_header("ACL", "public-read")
            .with_header("StorageClass", "GLACIER")
            .with_header("x-amz-server-side-encryption", "AES256");

        assert!(headers.is_empty());
        assert_eq!(headers.metadata("ACL"), None);
    }

    #[test]
    fn later_values_replace_earlier_ones() {
        let headers = PutHeaders::new()
            .with_content_type("image/jpeg")
            .with_metadata("image-width", "10")
            .with_header("content-type", "application/octet-stream")
            .with_header("image-width", "20");

        assert_eq!(headers.len(), 2);
        assert_eq!(
            headers.content_type().as_deref(),
            Some("application/octet-stream")
        );
        assert_eq!(headers.metadata("image-width").as_deref(), Some("20"));
    }
}
