//! Plain text passthrough, optionally trimming trailing whitespace.

use std::sync::Arc;

use converthub_module::{
    FileRef, Module, ModuleBuilder, OptionConfig, OptionType, ResolvedOptions, TransformError,
};

/// Module definition.
pub fn module() -> ModuleBuilder {
    Module::builder("TextToText")
        .description("Convert plaintext files to plaintext files.")
        .from("text/plain")
        .to("text/plain")
        .option(
            OptionConfig::new("trim", OptionType::Boolean)
                .description("Strip trailing whitespace from every line")
                .default_value(false),
        )
        .transform_fn(convert)
}

async fn convert(
    file: FileRef,
    options: Arc<ResolvedOptions>,
) -> Result<Option<FileRef>, TransformError> {
    if options.get_bool("trim").unwrap_or(false) {
        let text = tokio::fs::read_to_string(&file.path).await?;
        let mut trimmed: String = text
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n");
        if text.ends_with('\n') {
            trimmed.push('\n');
        }
        tokio::fs::write(&file.path, trimmed).await?;
    }
    Ok(None)
}
