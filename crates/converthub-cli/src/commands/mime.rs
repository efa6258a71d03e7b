//! Media type description command.

use clap::Args;

use converthub_core::error::AppError;
use converthub_engine::Orchestrator;

use crate::output::{self, OutputFormat};

/// Arguments for the mime command
#[derive(Debug, Args)]
pub struct MimeArgs {
    /// Media type to describe, e.g. `image/png`
    pub value: String,
}

/// Execute the mime command
pub fn execute(
    args: &MimeArgs,
    orchestrator: &Orchestrator,
    format: OutputFormat,
) -> Result<(), AppError> {
    let description = orchestrator.describe_mime_type(&args.value);

    match format {
        OutputFormat::Json => output::print_json(&description),
        OutputFormat::Table => {
            println!("{}", args.value);
            output::print_kv("Valid", if description.valid { "yes" } else { "no" });
            if let Some(extension) = &description.extension {
                output::print_kv("Extension", extension);
            }
            if let Some(charset) = &description.charset {
                output::print_kv("Charset", charset);
            }
            if let Some(content_type) = &description.content_type {
                output::print_kv("Content-Type", content_type);
            }
        }
    }

    Ok(())
}
