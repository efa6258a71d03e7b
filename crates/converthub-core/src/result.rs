//! Convenience result type alias for ConvertHub.

use crate::error::AppError;

/// A specialized `Result` type for ConvertHub operations.
pub type AppResult<T> = Result<T, AppError>;
