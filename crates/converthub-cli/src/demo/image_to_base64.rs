//! PNG or JPEG to base64 text, returning a full replacement descriptor.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use converthub_module::{
    FileRef, Module, ModuleBuilder, OptionConfig, OptionType, ResolvedOptions, ReturnMode,
    TransformError, replace_file_extension,
};

const TARGET: &str = "text/plain";

/// Module definition.
pub fn module() -> ModuleBuilder {
    Module::builder("ImageToBase64")
        .description("Encode PNG and JPEG images as base64 text.")
        .from_many(["image/jpeg", "image/png"])
        .to(TARGET)
        .option(
            OptionConfig::new("data_uri", OptionType::Boolean)
                .description("Prefix the output with a data URI header")
                .default_value(false),
        )
        .return_mode(ReturnMode::Replace)
        .transform_fn(convert)
}

async fn convert(
    file: FileRef,
    options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    let data = tokio::fs::read(&file.path).await?;

    let mut encoded = String::new();
    if options.get_bool("data_uri").unwrap_or(false) {
        encoded.push_str(&format!("data:{};base64,", file.mime_type));
    }
    encoded.push_str(&BASE64.encode(&data));
    tokio::fs::write(&file.path, &encoded).await?;

    Ok(Some(FileRef {
        original_name: replace_file_extension(&file.original_name, "txt"),
        mime_type: TARGET.to_string(),
        encoding: "utf-8".to_string(),
        size: encoded.len() as u64,
        ..file
    }))
}
