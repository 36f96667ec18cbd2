//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Upload size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Declared content type is not an image.
    #[error("content type '{content_type}' is not an image")]
    NotAnImage {
        /// The rejected content type.
        content_type: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// OpenDAL operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a not-an-image error.
    #[must_use]
    pub fn not_an_image(content_type: impl Into<String>) -> Self {
        Self::NotAnImage {
            content_type: content_type.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Returns true when the error is caller-fixable (bad input, not a
    /// provider failure).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::FileTooLarge { .. } | Self::NotAnImage { .. })
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        Self::Operation(err.to_string())
    }
}
