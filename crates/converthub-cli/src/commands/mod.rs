//! CLI command definitions and dispatch.

pub mod convert;
pub mod mime;
pub mod modules;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use converthub_core::GuessMimeLookup;
use converthub_core::config::AppConfig;
use converthub_core::error::AppError;
use converthub_engine::Orchestrator;

use crate::demo;
use crate::output::OutputFormat;

/// ConvertHub: run files through pluggable conversion modules
#[derive(Debug, Parser)]
#[command(name = "converthub", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (defaults to config/default.toml plus config/{env}.toml)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List registered conversion modules
    Modules,
    /// Describe a media type
    Mime(mime::MimeArgs),
    /// Convert local files with a module
    Convert(convert::ConvertArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let orchestrator = build_orchestrator(config).await?;

        match &self.command {
            Commands::Modules => modules::execute(&orchestrator, self.format).await,
            Commands::Mime(args) => mime::execute(args, &orchestrator, self.format),
            Commands::Convert(args) => convert::execute(args, &orchestrator, self.format).await,
        }
    }
}

/// Helper: load configuration from an explicit file or the environment layout
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, AppError> {
    match config_path {
        Some(path) => AppConfig::from_file(path),
        None => {
            let env =
                std::env::var("CONVERTHUB_ENV").unwrap_or_else(|_| "development".to_string());
            AppConfig::load(&env)
        }
    }
}

/// Helper: create an orchestrator with the bundled modules registered
pub async fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator, AppError> {
    let orchestrator = Orchestrator::new(config.engine.clone(), Arc::new(GuessMimeLookup::new()));
    demo::register_all(&orchestrator).await?;
    Ok(orchestrator)
}
