//! Identity error types.

use thiserror::Error;

/// Identity resolution errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email was missing or empty.
    #[error("email must not be empty")]
    EmptyEmail,

    /// Insert hit the email uniqueness constraint.
    ///
    /// Raised by the store when a concurrent first sign-in won the
    /// insert race; the resolver handles it by re-reading and never
    /// surfaces it to callers.
    #[error("user row already exists for this email")]
    Conflict,

    /// Datastore operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl IdentityError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
