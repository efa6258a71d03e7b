//! File handles passed through conversion.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Form field name every uploaded file is expected to arrive under.
pub const FILES_FIELD: &str = "files";

/// Default transfer encoding for freshly uploaded files.
pub const DEFAULT_ENCODING: &str = "7bit";

/// Legacy media types rewritten on submission.
const MIME_ALIASES: &[(&str, &str)] = &[("video/avi", "video/x-msvideo")];

/// Handle to a file already materialized on a backing store.
///
/// The core only ever rewrites metadata on it. The bytes behind `path`
/// belong to whoever uploaded them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileRef {
    /// Form field the file was uploaded under.
    #[serde(rename = "fieldname")]
    pub field_name: String,
    /// Name of the file as provided by the client.
    #[serde(rename = "originalname")]
    pub original_name: String,
    /// Transfer encoding or charset.
    pub encoding: String,
    /// Media type of the file contents.
    #[serde(rename = "mimetype")]
    pub mime_type: String,
    /// Directory the file is stored in.
    pub destination: PathBuf,
    /// Name of the file inside `destination`.
    #[serde(rename = "filename")]
    pub file_name: String,
    /// Full storage path.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

impl FileRef {
    /// Describe a stored file, deriving `destination` and `filename` from its path.
    pub fn new(
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        let path = path.into();
        let destination = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            field_name: FILES_FIELD.to_string(),
            original_name: original_name.into(),
            encoding: DEFAULT_ENCODING.to_string(),
            mime_type: mime_type.into(),
            destination,
            file_name,
            path,
            size,
        }
    }

    /// Rewrite legacy media type aliases to their registered names.
    pub fn normalize_mime_type(&mut self) {
        if let Some((_, canonical)) = MIME_ALIASES
            .iter()
            .find(|(alias, _)| self.mime_type.eq_ignore_ascii_case(alias))
        {
            self.mime_type = (*canonical).to_string();
        }
    }

    /// Extension of `original_name`, if it has one.
    pub fn extension(&self) -> Option<&str> {
        self.original_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }
}

/// Replace a file name's extension (`notes.txt` -> `notes.json`).
///
/// Only the part after the last `.` is replaced. A name without any `.`
/// gets the extension appended.
pub fn replace_file_extension(file_name: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    match file_name.rsplit_once('.') {
        Some((stem, _)) => format!("{stem}.{extension}"),
        None => format!("{file_name}.{extension}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_extension() {
        assert_eq!(replace_file_extension("a.png", "jpg"), "a.jpg");
        assert_eq!(replace_file_extension("archive.tar.gz", "zip"), "archive.tar.zip");
        assert_eq!(replace_file_extension("README", "txt"), "README.txt");
        assert_eq!(replace_file_extension("notes.txt", ".md"), "notes.md");
    }

    #[test]
    fn test_new_derives_location() {
        let file = FileRef::new("photo.png", "image/png", "/tmp/uploads/abc123", 42);
        assert_eq!(file.destination, PathBuf::from("/tmp/uploads"));
        assert_eq!(file.file_name, "abc123");
        assert_eq!(file.field_name, FILES_FIELD);
        assert_eq!(file.extension(), Some("png"));
    }

    #[test]
    fn test_normalize_avi() {
        let mut file = FileRef::new("clip.avi", "video/avi", "/tmp/clip", 1);
        file.normalize_mime_type();
        assert_eq!(file.mime_type, "video/x-msvideo");

        let mut other = FileRef::new("clip.mp4", "video/mp4", "/tmp/clip", 1);
        other.normalize_mime_type();
        assert_eq!(other.mime_type, "video/mp4");
    }

    #[test]
    fn test_serde_uses_upload_field_names() {
        let file = FileRef::new("a.txt", "text/plain", "/tmp/a", 3);
        let json = serde_json::to_value(&file).expect("serialize");
        assert_eq!(json["originalname"], "a.txt");
        assert_eq!(json["mimetype"], "text/plain");

        let mut bad = json.clone();
        bad["unexpected"] = serde_json::json!(true);
        assert!(serde_json::from_value::<FileRef>(bad).is_err());
    }
}
