//! Field-by-field checks for descriptors returned by replace-mode transforms.

use crate::file::{FILES_FIELD, FileRef};
use crate::module::Module;

/// Validate a replacement descriptor against the module's output contract.
///
/// Returns the first failing check as a message naming the field. When the
/// module's target type is not a recognized media type, the module vouches
/// for its own output and the extension and recognition checks are skipped.
pub fn validate_replacement(module: &Module, file: &FileRef) -> Result<(), String> {
    let mime = module.mime_lookup();
    let target_known = mime.is_known_type(module.to_type());

    if file.field_name != FILES_FIELD {
        return Err(format!(
            "fieldname must be \"{FILES_FIELD}\", got \"{}\"",
            file.field_name
        ));
    }

    if file.original_name.trim().is_empty() {
        return Err("originalname is missing or empty".to_string());
    }
    if target_known {
        let Some(extension) = file.extension() else {
            return Err(format!(
                "originalname \"{}\" has no extension",
                file.original_name
            ));
        };
        let matches_target = mime
            .types_for_extension(extension)
            .iter()
            .any(|t| t.eq_ignore_ascii_case(module.to_type()));
        if !matches_target {
            return Err(format!(
                "originalname extension \".{extension}\" does not match \"{}\"",
                module.to_type()
            ));
        }
    }

    if file.encoding.trim().is_empty() {
        return Err("encoding is missing or empty".to_string());
    }

    if file.mime_type.trim().is_empty() {
        return Err("mimetype is missing or empty".to_string());
    }
    if target_known && !mime.is_known_type(&file.mime_type) {
        return Err(format!(
            "mimetype \"{}\" is not a recognized media type",
            file.mime_type
        ));
    }
    if !module.converts_to(&file.mime_type) {
        return Err(format!(
            "mimetype \"{}\" is not the module's target \"{}\"",
            file.mime_type,
            module.to_type()
        ));
    }

    if file.destination.as_os_str().is_empty() {
        return Err("destination is missing or empty".to_string());
    }
    if file.file_name.trim().is_empty() {
        return Err("filename is missing or empty".to_string());
    }
    if file.path.as_os_str().is_empty() {
        return Err("path is missing or empty".to_string());
    }

    Ok(())
}
