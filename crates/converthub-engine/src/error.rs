//! Errors raised by the orchestrator and jobs.

use converthub_core::error::AppError;
use converthub_core::types::JobId;
use converthub_module::ModuleError;

use crate::job::JobStep;

/// Error from job submission, execution, or management.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No module is registered under the requested label.
    #[error("No conversion module exists with label '{label}'")]
    UnknownModule {
        /// Requested label.
        label: String,
    },

    /// The module handed to job creation is not registered with this orchestrator.
    #[error("Module '{label}' is not registered with this orchestrator")]
    InvalidModuleReference {
        /// Label of the foreign module.
        label: String,
    },

    /// A submitted option label is not declared by the module.
    #[error("Module '{module}' has no option '{label}'")]
    UnknownOption {
        /// Module label.
        module: String,
        /// Unknown option label.
        label: String,
    },

    /// A submission carried no files.
    #[error("No files provided")]
    EmptyFileList,

    /// A submitted file's media type is not accepted by the module.
    #[error(
        "Module '{module}' does not support mimetype '{mime}'. Supported mimetypes: {}",
        .supported.join(", ")
    )]
    UnsupportedMimeType {
        /// Module label.
        module: String,
        /// Rejected media type.
        mime: String,
        /// Media types the module accepts.
        supported: Vec<String>,
    },

    /// A submission exceeded the configured total size limit.
    #[error("Submission of {total} bytes exceeds the limit of {limit} bytes")]
    FileSizeLimitExceeded {
        /// Total submitted bytes.
        total: u64,
        /// Configured limit.
        limit: u64,
    },

    /// `run` was called on a job that already started.
    #[error("Job '{id}' has already been started")]
    JobAlreadyStarted {
        /// Job identifier.
        id: JobId,
    },

    /// No job exists with the requested identifier.
    #[error("No job found with ID '{id}'")]
    JobNotFound {
        /// Job identifier.
        id: JobId,
    },

    /// The operation needs a finished job.
    #[error("Job '{id}' is {step}, not finished")]
    JobNotTerminal {
        /// Job identifier.
        id: JobId,
        /// Current step.
        step: JobStep,
    },

    /// The job failed and has no results to hand out.
    #[error("Job '{id}' failed: {reason}")]
    JobFailed {
        /// Job identifier.
        id: JobId,
        /// Recorded failure.
        reason: String,
    },

    /// A module or option error surfaced through the engine.
    #[error(transparent)]
    Module(#[from] ModuleError),
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Module(inner) => AppError::from(inner),
            EngineError::UnknownModule { .. } | EngineError::JobNotFound { .. } => {
                AppError::not_found(err.to_string())
            }
            EngineError::InvalidModuleReference { .. }
            | EngineError::UnknownOption { .. }
            | EngineError::EmptyFileList
            | EngineError::UnsupportedMimeType { .. }
            | EngineError::FileSizeLimitExceeded { .. } => AppError::validation(err.to_string()),
            EngineError::JobAlreadyStarted { .. }
            | EngineError::JobNotTerminal { .. }
            | EngineError::JobFailed { .. } => AppError::conflict(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use converthub_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_unsupported_mime_message_lists_types() {
        let err = EngineError::UnsupportedMimeType {
            module: "JPGToBase64".to_string(),
            mime: "image/gif".to_string(),
            supported: vec!["image/jpeg".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Module 'JPGToBase64' does not support mimetype 'image/gif'. Supported mimetypes: image/jpeg"
        );
    }

    #[test]
    fn test_app_error_mapping() {
        let id = JobId::new();
        assert_eq!(
            AppError::from(EngineError::JobNotFound { id }).kind,
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(EngineError::JobNotTerminal {
                id,
                step: JobStep::Running
            })
            .kind,
            ErrorKind::Conflict
        );
        let module_err = ModuleError::InvalidOptionValue {
            label: "width".to_string(),
            reason: "expected a number, got string".to_string(),
        };
        assert_eq!(
            AppError::from(EngineError::from(module_err)).kind,
            ErrorKind::Validation
        );
    }
}
