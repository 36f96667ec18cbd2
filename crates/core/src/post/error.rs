//! Post error types.

use thiserror::Error;

use crate::storage::StorageError;

/// Post operation errors.
#[derive(Debug, Error)]
pub enum PostError {
    /// Missing or invalid required field.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Post not found.
    #[error("post not found: {0}")]
    NotFound(i64),

    /// Storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl PostError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns true when the error is caller-fixable.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::Validation(_) | Self::NotFound(_) => true,
            Self::Storage(e) => e.is_validation(),
            Self::Repository(_) => false,
        }
    }
}
