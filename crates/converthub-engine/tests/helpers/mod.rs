//! Shared helpers for engine integration tests.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use converthub_core::GuessMimeLookup;
use converthub_core::config::EngineConfig;
use converthub_engine::Orchestrator;
use converthub_module::{
    FileRef, Module, ModuleBuilder, OptionConfig, OptionType, ResolvedOptions, ReturnMode,
    TransformError, replace_file_extension,
};

/// Orchestrator with default settings and the bundled media type table.
pub fn orchestrator() -> Orchestrator {
    orchestrator_with(EngineConfig::default())
}

/// Orchestrator with the given settings.
pub fn orchestrator_with(config: EngineConfig) -> Orchestrator {
    Orchestrator::new(config, Arc::new(GuessMimeLookup::new()))
}

/// A stored upload with the given name, type, and size.
pub fn upload(name: &str, mime: &str, size: u64) -> FileRef {
    FileRef::new(name, mime, format!("/var/uploads/{name}"), size)
}

/// Turn a JSON object literal into an option map.
pub fn options(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Transform that sleeps for the file's size in milliseconds, then keeps it.
pub async fn slow_keep(
    file: FileRef,
    _options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    tokio::time::sleep(Duration::from_millis(file.size % 50)).await;
    Ok(None)
}

/// Transform that returns a text replacement whose media type is missing.
/// Every other field is valid for a `text/plain` target.
pub async fn drop_mimetype(
    mut file: FileRef,
    _options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    file.original_name = replace_file_extension(&file.original_name, "txt");
    file.encoding = "utf-8".to_string();
    file.mime_type = String::new();
    Ok(Some(file))
}

/// Transform that fails on any file whose name starts with "bad".
pub async fn fail_bad(
    file: FileRef,
    _options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    if file.original_name.starts_with("bad") {
        return Err(format!("cannot decode {}", file.original_name).into());
    }
    Ok(None)
}

/// PNG to JPEG module, rename and retag only.
pub fn png_to_jpeg() -> ModuleBuilder {
    Module::builder("PNGToJPEG")
        .description("Re-encode PNG images as JPEG")
        .from("image/png")
        .to("image/jpeg")
        .option(OptionConfig::new("width", OptionType::Number).default_value(1024))
        .option(OptionConfig::new("size", OptionType::Number).default_value(10))
        .transform_fn(slow_keep)
}

/// Replace-mode module whose transform forgets the media type.
pub fn broken_replace() -> ModuleBuilder {
    Module::builder("BrokenReplace")
        .from("image/png")
        .to("text/plain")
        .return_mode(ReturnMode::Replace)
        .transform_fn(drop_mimetype)
}

/// Module that fails on some inputs.
pub fn picky() -> ModuleBuilder {
    Module::builder("Picky")
        .from("text/plain")
        .to("text/plain")
        .transform_fn(fail_bad)
}
