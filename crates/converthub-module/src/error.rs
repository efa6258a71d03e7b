//! Error type for module definition, option validation, and conversion.

use converthub_core::error::AppError;
use thiserror::Error;

/// Errors raised by modules, their options, and the module registry.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// A module definition is malformed. Fatal at startup.
    #[error("Invalid config for module '{module}': {field}: {reason}")]
    InvalidModuleConfig {
        /// Label of the offending module (possibly empty).
        module: String,
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An option definition is malformed. Fatal at startup.
    #[error("Invalid config for option '{label}': {reason}")]
    InvalidOptionConfig {
        /// Label of the offending option (possibly empty).
        label: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A caller-supplied option value failed validation.
    #[error("Invalid value for option '{label}': {reason}")]
    InvalidOptionValue {
        /// Option label.
        label: String,
        /// What is wrong with the value.
        reason: String,
    },

    /// A transform's output disagrees with the module's declared contract.
    #[error("Module '{module}' violated its contract on '{file}': {reason}")]
    ContractViolation {
        /// Module label.
        module: String,
        /// Original name of the file being converted.
        file: String,
        /// Explanation naming the offending field or return shape.
        reason: String,
    },

    /// The integrator-supplied transform itself failed.
    #[error("Module '{module}' failed to convert '{file}': {reason}")]
    TransformFailed {
        /// Module label.
        module: String,
        /// Original name of the file being converted.
        file: String,
        /// Error reported by the transform.
        reason: String,
    },

    /// A per-file conversion task panicked or was aborted.
    #[error("Conversion task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),

    /// A module with the same label is already registered.
    #[error("A module is already registered with the label '{label}'")]
    DuplicateModule {
        /// The duplicated label.
        label: String,
    },
}

impl ModuleError {
    /// Whether this error belongs to startup configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::InvalidModuleConfig { .. }
                | Self::InvalidOptionConfig { .. }
                | Self::DuplicateModule { .. }
        )
    }
}

impl From<ModuleError> for AppError {
    fn from(err: ModuleError) -> Self {
        match &err {
            ModuleError::InvalidModuleConfig { .. }
            | ModuleError::InvalidOptionConfig { .. }
            | ModuleError::DuplicateModule { .. } => AppError::configuration(err.to_string()),
            ModuleError::InvalidOptionValue { .. } => AppError::validation(err.to_string()),
            ModuleError::ContractViolation { .. } | ModuleError::TransformFailed { .. } => {
                AppError::module(err.to_string())
            }
            ModuleError::TaskFailed(_) => AppError::internal(err.to_string()),
        }
    }
}
