//! Demo conversion modules bundled with the CLI.

pub mod image_to_base64;
pub mod jpg_to_base64;
pub mod text_to_text;

use converthub_engine::{EngineError, Orchestrator};
use tracing::info;

/// Register every bundled module.
pub async fn register_all(orchestrator: &Orchestrator) -> Result<(), EngineError> {
    orchestrator.register_module(text_to_text::module()).await?;
    orchestrator.register_module(jpg_to_base64::module()).await?;
    orchestrator.register_module(image_to_base64::module()).await?;

    info!(count = orchestrator.module_count().await, "Demo modules registered");
    Ok(())
}
