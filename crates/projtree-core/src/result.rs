//! Convenience result type alias for ProjTree.

use crate::error::AppError;

/// A specialized `Result` type for ProjTree operations.
pub type AppResult<T> = Result<T, AppError>;
