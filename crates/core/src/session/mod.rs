//! Session type and per-read enrichment.
//!
//! The session itself is owned by the external auth layer (it is
//! minted at sign-in and carried as a signed token); this module only
//! augments a session value with the durable user id on each read.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::identity::UserStore;

/// A request session as seen by the core.
///
/// `user_id` starts empty and is populated by [`SessionEnricher`];
/// its absence means "unauthorized for owner-only actions", never a
/// crash.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// OAuth-verified email the session is keyed by.
    pub email: String,
    /// Display name from the OAuth profile.
    pub name: String,
    /// Avatar URL from the OAuth profile, if any.
    pub picture: Option<String>,
    /// Durable user id, attached by enrichment.
    pub user_id: Option<i64>,
}

impl Session {
    /// Build an unenriched session from token claims.
    #[must_use]
    pub fn new(email: impl Into<String>, name: impl Into<String>, picture: Option<String>) -> Self {
        Self {
            email: email.into(),
            name: name.into(),
            picture,
            user_id: None,
        }
    }
}

/// Attaches the durable user id to sessions on every read.
pub struct SessionEnricher<S: UserStore> {
    store: Arc<S>,
}

impl<S: UserStore> SessionEnricher<S> {
    /// Create a new session enricher.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Return a new session with `user_id` populated from the user
    /// row matching the session email.
    ///
    /// This runs on every session read and must never fail into the
    /// caller: a missing row (identity not yet resolved) or a
    /// datastore error both yield the original session unchanged, the
    /// latter with a log line.
    pub async fn enrich(&self, session: Session) -> Session {
        match self.store.find_by_email(&session.email).await {
            Ok(Some(user)) => Session {
                user_id: Some(user.id),
                ..session
            },
            Ok(None) => session,
            Err(e) => {
                warn!(email = %session.email, error = %e, "session enrichment lookup failed");
                session
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityError, NewUser, UserRecord};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MockUserStore {
        users: Mutex<HashMap<String, UserRecord>>,
        fail_lookups: bool,
    }

    impl MockUserStore {
        fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                fail_lookups: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_lookups: true,
                ..Self::new()
            }
        }

        fn seed(&self, id: i64, email: &str, name: &str) {
            self.users.lock().unwrap().insert(
                email.to_string(),
                UserRecord {
                    id,
                    name: name.to_string(),
                    email: email.to_string(),
                    picture: None,
                    created_at: chrono::Utc::now(),
                },
            );
        }
    }

    impl UserStore for MockUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
            if self.fail_lookups {
                return Err(IdentityError::repository("connection refused"));
            }
            Ok(self.users.lock().unwrap().get(email).cloned())
        }

        async fn insert(&self, _user: NewUser) -> Result<UserRecord, IdentityError> {
            unimplemented!("enrichment never inserts")
        }
    }

    #[tokio::test]
    async fn test_enrich_attaches_user_id() {
        let store = Arc::new(MockUserStore::new());
        store.seed(7, "a@x.com", "Alice");
        let enricher = SessionEnricher::new(store);

        let session = enricher.enrich(Session::new("a@x.com", "Alice", None)).await;

        assert_eq!(session.user_id, Some(7));
        assert_eq!(session.email, "a@x.com");
    }

    #[tokio::test]
    async fn test_enrich_unknown_user_returns_session_unmodified() {
        let store = Arc::new(MockUserStore::new());
        let enricher = SessionEnricher::new(store);

        let session = enricher
            .enrich(Session::new("nobody@x.com", "Nobody", None))
            .await;

        assert_eq!(session.user_id, None);
        assert_eq!(session.email, "nobody@x.com");
        assert_eq!(session.name, "Nobody");
    }

    #[tokio::test]
    async fn test_enrich_degrades_on_store_failure() {
        let store = Arc::new(MockUserStore::failing());
        let enricher = SessionEnricher::new(store);

        // Must not panic or error; reads degrade gracefully.
        let session = enricher.enrich(Session::new("a@x.com", "Alice", None)).await;

        assert_eq!(session.user_id, None);
    }
}
