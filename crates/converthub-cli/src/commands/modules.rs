//! Module listing command.

use serde::Serialize;
use tabled::Tabled;

use converthub_core::error::AppError;
use converthub_engine::Orchestrator;
use converthub_module::ModuleInfo;

use crate::output::{self, OutputFormat};

/// Module display row
#[derive(Debug, Serialize, Tabled)]
struct ModuleRow {
    /// Label
    label: String,
    /// Accepted media types
    from: String,
    /// Output media type
    to: String,
    /// Return mode
    mode: String,
    /// Option labels
    options: String,
    /// Description
    description: String,
}

impl From<&ModuleInfo> for ModuleRow {
    fn from(info: &ModuleInfo) -> Self {
        let options: Vec<String> = info
            .options
            .iter()
            .map(|o| {
                let marker = if o.is_required() { "*" } else { "" };
                format!("{}{marker} ({})", o.label(), o.kind())
            })
            .collect();

        Self {
            label: info.label.clone(),
            from: info.from.join(", "),
            to: info.to.clone(),
            mode: format!("{:?}", info.return_mode).to_lowercase(),
            options: options.join(", "),
            description: info.description.clone().unwrap_or_default(),
        }
    }
}

/// Execute the modules command
pub async fn execute(orchestrator: &Orchestrator, format: OutputFormat) -> Result<(), AppError> {
    let modules = orchestrator.list_modules().await;

    match format {
        OutputFormat::Json => output::print_json(&modules),
        OutputFormat::Table => {
            let rows: Vec<ModuleRow> = modules.iter().map(ModuleRow::from).collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use converthub_core::GuessMimeLookup;
    use converthub_core::config::EngineConfig;

    use super::*;
    use crate::demo;

    #[tokio::test]
    async fn test_rows_from_demo_modules() {
        let orchestrator = Orchestrator::new(EngineConfig::default(), Arc::new(GuessMimeLookup::new()));
        demo::register_all(&orchestrator).await.unwrap();

        let modules = orchestrator.list_modules().await;
        let rows: Vec<ModuleRow> = modules.iter().map(ModuleRow::from).collect();

        let image = &rows[0];
        assert_eq!(image.label, "ImageToBase64");
        assert_eq!(image.from, "image/jpeg, image/png");
        assert_eq!(image.mode, "replace");
        assert_eq!(image.options, "data_uri (boolean)");
    }
}
