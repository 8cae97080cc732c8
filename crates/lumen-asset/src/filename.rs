//! Filename sanitizing.
//!
//! Turns an arbitrary user-supplied filename into a storage-safe one:
//! the name part is passed through a transform (a URL slug by default),
//! stripped of characters no filesystem accepts, truncated, and suffixed
//! with a random token so two uploads of `photo.jpg` never collide.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use uuid::Uuid;

use crate::{Error, Result};

/// Maximum length in bytes of a sanitized filename, extension included.
pub const MAX_FILENAME_LEN: usize = 100;

/// Splits a filename into name and optional extension.
///
/// Only a trailing `.` followed by ASCII letters counts as an extension,
/// so `archive.tar.gz` splits into `archive.tar` and `gz` while
/// `notes.v2` has no extension at all.
static FILENAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^:\n].*?)(\.[A-Za-z]+)?$").expect("filename pattern is a valid regex")
});

/// Transform applied to the name part of a filename.
pub type FilenameTransform = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// A filename split into its name and (dot-less) extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilenameParts<'a> {
    /// Everything before the extension.
    pub name: &'a str,
    /// Extension without the leading dot, as written.
    pub extension: Option<&'a str>,
}

impl<'a> FilenameParts<'a> {
    /// Splits `filename` into name and extension.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] for an empty filename or one that
    /// starts with `:` or a newline.
    pub fn split(filename: &'a str) -> Result<Self> {
        let captures = FILENAME_PATTERN
            .captures(filename)
            .ok_or_else(|| Error::InvalidFilename(filename.to_owned()))?;

        let name = captures
            .get(1)
            .map(|m| m.as_str())
            .ok_or_else(|| Error::InvalidFilename(filename.to_owned()))?;
        let extension = captures.get(2).map(|m| &m.as_str()[1..]);

        Ok(Self { name, extension })
    }

    /// Returns the extension lower-cased.
    pub fn extension_lowercase(&self) -> Option<String> {
        self.extension.map(str::to_ascii_lowercase)
    }
}

/// Produces storage-safe, collision-resistant filenames.
#[derive(Clone, Default)]
pub struct FilenameSanitizer {
    transform: Option<FilenameTransform>,
}

impl fmt::Debug for FilenameSanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilenameSanitizer")
            .field("custom_transform", &self.transform.is_some())
            .finish()
    }
}

impl FilenameSanitizer {
    /// Creates a sanitizer using the default slug transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the default slug transform.
    #[must_use]
    pub fn with_transform(mut self, transform: FilenameTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Sanitizes `filename` with a freshly minted random token.
    pub fn sanitize(&self, filename: &str) -> Result<String> {
        let token = Uuid::new_v4().simple().to_string();
        self.sanitize_with_token(filename, &token)
    }

    /// Sanitizes `filename`, appending `token` as the uniqueness suffix.
    ///
    /// The result is `{name}-{token}{.ext}`, or `{token}{.ext}` when the
    /// transformed name is empty. The name is truncated so the whole result
    /// fits in [`MAX_FILENAME_LEN`] bytes; the token is never truncated. An
    /// extension too long to fit next to the token is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFilename`] if `filename` cannot be split.
    pub fn sanitize_with_token(&self, filename: &str, token: &str) -> Result<String> {
        let parts = FilenameParts::split(filename)?;

        let mut extension = parts.extension.map(|ext| format!(".{ext}")).unwrap_or_default();
        if token.len() + extension.len() > MAX_FILENAME_LEN {
            extension.clear();
        }

        let transformed = match &self.transform {
            Some(transform) => transform(parts.name),
            None => slugify(parts.name),
        };
        let name = strip_reserved(&transformed);

        let budget = MAX_FILENAME_LEN
            .saturating_sub(token.len() + extension.len())
            .saturating_sub(1);
        let name = truncate(&name, budget);

        if name.is_empty() {
            Ok(format!("{token}{extension}"))
        } else {
            Ok(format!("{name}-{token}{extension}"))
        }
    }
}

/// Lower-cases `input` into a dash-separated ASCII slug.
///
/// Case changes inside a word start a new segment, so `MyPhoto` becomes
/// `my-photo`. Runs of anything that is not an ASCII letter or digit
/// collapse into one dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    let mut prev_lower = false;

    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if (pending_dash || (prev_lower && c.is_ascii_uppercase())) && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
            prev_lower = false;
        }
    }

    slug
}

/// Replaces characters that are invalid in filenames on common systems.
fn strip_reserved(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let reserved = c.is_control()
            || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*');
        let c = if reserved { '-' } else { c };
        if c == '-' && out.ends_with('-') {
            continue;
        }
        out.push(c);
    }

    out.trim_matches(|c: char| c == '-' || c == '.' || c.is_whitespace())
        .to_owned()
}

/// Cuts `input` to at most `max` bytes on a char boundary.
fn truncate(input: &str, max: usize) -> &str {
    if input.len() <= max {
        return input;
    }

    let end = input
        .char_indices()
        .map(|(i, _)| i)
        .take_while(|&i| i <= max)
        .last()
        .unwrap_or(0);
    input[..end].trim_end_matches('-')
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn splits_name_and_extension() {
        let parts = FilenameParts::split("My Photo.JPG").unwrap();
        assert_eq!(parts.name, "My Photo");
        assert_eq!(parts.extension, Some("JPG"));
        assert_eq!(parts.extension_lowercase().as_deref(), Some("jpg"));

        let parts = FilenameParts::split("archive.tar.gz").unwrap();
        assert_eq!((parts.name, parts.extension), ("archive.tar", Some("gz")));

        let parts = FilenameParts::split("notes.v2").unwrap();
        assert_eq!((parts.name, parts.extension), ("notes.v2", None));
    }

    #[test]
    fn rejects_empty_and_malformed() {
        for bad in ["", ":photo.jpg", "\nphoto.jpg"] {
            let err = FilenameParts::split(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidFilename(_)), "{bad:?}");
        }
        assert!(FilenameSanitizer::new().sanitize("").is_err());
    }

    #[test]
    fn slugifies_with_token() {
        let name = FilenameSanitizer::new()
            .sanitize_with_token("My Photo.JPG", TOKEN)
            .unwrap();
        assert_eq!(name, format!("my-photo-{TOKEN}.JPG"));
    }

    #[test]
    fn slug_splits_camel_case_and_punctuation() {
        assert_eq!(slugify("MyPhoto"), "my-photo");
        assert_eq!(slugify("  Hello,   World!! "), "hello-world");
        assert_eq!(slugify("IMG_2041"), "img-2041");
        assert_eq!(slugify("ÉtéPlage"), "t-plage");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn empty_name_yields_token_only() {
        let name = FilenameSanitizer::new()
            .sanitize_with_token("!!!.png", TOKEN)
            .unwrap();
        assert_eq!(name, format!("{TOKEN}.png"));
    }

    #[test]
    fn long_names_are_truncated_not_the_token() {
        let long = format!("{}.jpeg", "a".repeat(300));
        let name = FilenameSanitizer::new()
            .sanitize_with_token(&long, TOKEN)
            .unwrap();

        assert_eq!(name.len(), MAX_FILENAME_LEN);
        assert!(name.ends_with(&format!("-{TOKEN}.jpeg")));
    }

    #[test]
    fn oversized_extension_is_dropped() {
        let long = format!("photo.{}", "x".repeat(90));
        let name = FilenameSanitizer::new()
            .sanitize_with_token(&long, TOKEN)
            .unwrap();
        assert_eq!(name, format!("photo-{TOKEN}"));
    }

    #[test]
    fn custom_transform_output_is_made_safe() {
        let sanitizer = FilenameSanitizer::new()
            .with_transform(Arc::new(|name: &str| format!("../{name}/<raw>")));
        let name = sanitizer.sanitize_with_token("Shot.png", TOKEN).unwrap();

        assert_eq!(name, format!("Shot-raw-{TOKEN}.png"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn multibyte_names_truncate_on_char_boundary() {
        let sanitizer =
            FilenameSanitizer::new().with_transform(Arc::new(|name: &str| name.to_owned()));
        let name = sanitizer
            .sanitize_with_token(&format!("{}.png", "é".repeat(80)), TOKEN)
            .unwrap();

        assert!(name.len() <= MAX_FILENAME_LEN);
        assert!(name.ends_with(&format!("-{TOKEN}.png")));
    }

    #[test]
    fn minted_tokens_differ() {
        let sanitizer = FilenameSanitizer::new();
        let a = sanitizer.sanitize("photo.jpg").unwrap();
        let b = sanitizer.sanitize("photo.jpg").unwrap();

        assert_ne!(a, b);
        assert!(a.starts_with("photo-") && a.ends_with(".jpg"));
    }
}
