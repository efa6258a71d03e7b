//! Default [`MimeLookup`] backed by the `mime_guess` extension table.

use serde::{Deserialize, Serialize};

use crate::traits::mime::MimeLookup;

/// Extensions that win over `mime_guess`'s alphabetical ordering.
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("application/javascript", "js"),
    ("application/json", "json"),
    ("audio/mpeg", "mp3"),
    ("image/jpeg", "jpg"),
    ("image/svg+xml", "svg"),
    ("image/tiff", "tif"),
    ("text/csv", "csv"),
    ("text/html", "html"),
    ("text/markdown", "md"),
    ("text/plain", "txt"),
    ("video/mp4", "mp4"),
    ("video/mpeg", "mpeg"),
    ("video/quicktime", "mov"),
    ("video/x-msvideo", "avi"),
];

/// Non-`text/*` types that still default to UTF-8.
const UTF8_APPLICATION_TYPES: &[&str] = &[
    "application/javascript",
    "application/json",
    "application/xml",
    "image/svg+xml",
];

/// `mime_guess`-backed media type lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMimeLookup;

impl GuessMimeLookup {
    /// Create a new lookup.
    pub fn new() -> Self {
        Self
    }
}

impl MimeLookup for GuessMimeLookup {
    fn extension_of(&self, mime: &str) -> Option<String> {
        let mime = mime.trim().to_ascii_lowercase();

        if let Some((_, ext)) = PREFERRED_EXTENSIONS.iter().find(|(m, _)| *m == mime) {
            return Some((*ext).to_string());
        }

        mime_guess::get_mime_extensions_str(&mime)
            .and_then(|exts| exts.first())
            .map(|ext| (*ext).to_string())
    }

    fn charset_of(&self, mime: &str) -> Option<String> {
        let mime = mime.trim().to_ascii_lowercase();
        if !self.is_known_type(&mime) {
            return None;
        }

        if mime.starts_with("text/") || UTF8_APPLICATION_TYPES.contains(&mime.as_str()) {
            Some("UTF-8".to_string())
        } else {
            None
        }
    }

    fn is_known_type(&self, value: &str) -> bool {
        let value = value.trim().to_ascii_lowercase();
        value.contains('/') && mime_guess::get_mime_extensions_str(&value).is_some()
    }

    fn types_for_extension(&self, extension: &str) -> Vec<String> {
        mime_guess::from_ext(extension.trim_start_matches('.'))
            .iter()
            .map(|m| m.essence_str().to_string())
            .collect()
    }
}

/// Description of a media type, as reported to callers validating input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MimeDescription {
    /// Whether the value is a recognized media type.
    pub valid: bool,
    /// Canonical extension.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    /// Default charset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    /// Full content type header value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// Describe a media type using the given lookup.
pub fn describe(lookup: &dyn MimeLookup, value: &str) -> MimeDescription {
    if !lookup.is_known_type(value) {
        return MimeDescription {
            valid: false,
            extension: None,
            charset: None,
            content_type: None,
        };
    }

    MimeDescription {
        valid: true,
        extension: lookup.extension_of(value),
        charset: lookup.charset_of(value),
        content_type: lookup.content_type_of(value),
    }
}
