//! User identity types.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A durable user record.
///
/// The numeric `id` is assigned by the datastore on first insert and
/// is the only identifier ever exposed to authorization checks.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    /// Datastore-assigned stable identifier.
    pub id: i64,
    /// Display name captured at first sign-in.
    pub name: String,
    /// OAuth-verified email, the natural key.
    pub email: String,
    /// Avatar URL from the OAuth profile, if any.
    pub picture: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Input for inserting a user row on first sign-in.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Display name from the OAuth profile.
    pub name: String,
    /// OAuth-verified email.
    pub email: String,
    /// Avatar URL from the OAuth profile, if any.
    pub picture: Option<String>,
}
