//! Media type lookup capability.

/// Answers questions about media types (mimetypes).
///
/// Modules and the orchestrator never consult a global table; they are
/// handed an implementation at construction time.
pub trait MimeLookup: Send + Sync + std::fmt::Debug {
    /// Canonical file extension for a media type, without the leading dot.
    fn extension_of(&self, mime: &str) -> Option<String>;

    /// Default charset for a media type, if it has one.
    fn charset_of(&self, mime: &str) -> Option<String>;

    /// Whether the given string is a recognized media type.
    fn is_known_type(&self, value: &str) -> bool;

    /// All media types associated with a file extension.
    fn types_for_extension(&self, extension: &str) -> Vec<String>;

    /// Full `Content-Type` header value for a media type.
    fn content_type_of(&self, mime: &str) -> Option<String> {
        if !self.is_known_type(mime) {
            return None;
        }
        Some(match self.charset_of(mime) {
            Some(charset) => format!("{}; charset={}", mime, charset.to_lowercase()),
            None => mime.to_string(),
        })
    }
}
