//! JPEG to base64 text, rewriting the stored bytes in place.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use converthub_module::{FileRef, Module, ModuleBuilder, ResolvedOptions, TransformError};

/// Module definition.
pub fn module() -> ModuleBuilder {
    Module::builder("JPGToBase64")
        .description("Encode JPEG images as base64 text.")
        .from("image/jpeg")
        .to("text/plain")
        .transform_fn(convert)
}

async fn convert(
    file: FileRef,
    _options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    let data = tokio::fs::read(&file.path).await?;
    tokio::fs::write(&file.path, BASE64.encode(&data)).await?;
    Ok(None)
}
