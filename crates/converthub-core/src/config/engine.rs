//! Job engine configuration.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Settings for the orchestrator and its job set.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remove a job from the job set once its results have been taken.
    #[serde(default = "default_true")]
    pub clear_job_on_download: bool,
    /// Recommended cap on the total size of one submission, in bytes.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub file_size_limit_bytes: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            clear_job_on_download: default_true(),
            file_size_limit_bytes: None,
        }
    }
}

fn default_true() -> bool {
    true
}
