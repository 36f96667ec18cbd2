//! Identity resolver implementation.

use std::sync::Arc;

use tracing::info;

use super::error::IdentityError;
use super::types::{NewUser, UserRecord};

/// Store trait for user persistence.
///
/// This trait is implemented by the db crate to provide actual database
/// operations. `insert` must be guarded by the email uniqueness
/// constraint at the datastore and report a duplicate-key failure as
/// `IdentityError::Conflict`.
pub trait UserStore: Send + Sync {
    /// Find a user by exact email match.
    fn find_by_email(
        &self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<UserRecord>, IdentityError>> + Send;

    /// Insert a new user row; the datastore assigns the id.
    fn insert(
        &self,
        user: NewUser,
    ) -> impl std::future::Future<Output = Result<UserRecord, IdentityError>> + Send;
}

/// Resolves OAuth-verified identities into durable user ids.
pub struct IdentityResolver<S: UserStore> {
    store: Arc<S>,
}

impl<S: UserStore> IdentityResolver<S> {
    /// Create a new identity resolver.
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Resolve an OAuth-verified `(email, name)` pair to a user id.
    ///
    /// The upsert is insert-only: if a row already exists for the
    /// email, its stored `name` and `picture` are left untouched even
    /// when the profile has changed since first sign-in. Two
    /// concurrent first sign-ins race on the uniqueness constraint;
    /// the loser re-reads the row the winner inserted.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is empty or the datastore fails.
    /// Callers must treat any error as "authentication denied" - there
    /// is no degraded-identity outcome.
    pub async fn resolve(
        &self,
        email: &str,
        name: &str,
        picture: Option<String>,
    ) -> Result<i64, IdentityError> {
        if email.is_empty() {
            return Err(IdentityError::EmptyEmail);
        }

        if let Some(user) = self.store.find_by_email(email).await? {
            return Ok(user.id);
        }

        let new_user = NewUser {
            name: name.to_string(),
            email: email.to_string(),
            picture,
        };

        match self.store.insert(new_user).await {
            Ok(user) => {
                info!(user_id = user.id, "created user on first sign-in");
                Ok(user.id)
            }
            Err(IdentityError::Conflict) => {
                // Lost the first-sign-in race; the row exists now.
                self.store
                    .find_by_email(email)
                    .await?
                    .map(|user| user.id)
                    .ok_or_else(|| {
                        IdentityError::repository("user row missing after duplicate-key insert")
                    })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    /// Mock store for testing.
    ///
    /// `fail_first_insert` simulates the duplicate-key outcome of a
    /// lost first-sign-in race: the insert reports a conflict and the
    /// "winning" row becomes visible for the re-read.
    struct MockUserStore {
        users: Mutex<HashMap<String, UserRecord>>,
        next_id: AtomicI64,
        insert_calls: AtomicUsize,
        fail_first_insert: bool,
    }

    impl MockUserStore {
        fn new() -> Self {
            Self {
                users: Mutex::new(HashMap::new()),
                next_id: AtomicI64::new(1),
                insert_calls: AtomicUsize::new(0),
                fail_first_insert: false,
            }
        }

        fn with_racing_insert() -> Self {
            Self {
                fail_first_insert: true,
                ..Self::new()
            }
        }
    }

    impl UserStore for MockUserStore {
        async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
            Ok(self.users.lock().unwrap().get(email).cloned())
        }

        async fn insert(&self, user: NewUser) -> Result<UserRecord, IdentityError> {
            let call = self.insert_calls.fetch_add(1, Ordering::SeqCst);

            let mut users = self.users.lock().unwrap();
            if users.contains_key(&user.email) {
                return Err(IdentityError::Conflict);
            }

            let record = UserRecord {
                id: self.next_id.fetch_add(1, Ordering::SeqCst),
                name: user.name,
                email: user.email.clone(),
                picture: user.picture,
                created_at: chrono::Utc::now(),
            };

            if self.fail_first_insert && call == 0 {
                // The concurrent sign-in won: its row lands, ours conflicts.
                users.insert(user.email, record);
                return Err(IdentityError::Conflict);
            }

            users.insert(user.email, record.clone());
            Ok(record)
        }
    }

    #[tokio::test]
    async fn test_first_sign_in_inserts_row() {
        let store = Arc::new(MockUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let id = resolver
            .resolve("a@x.com", "Alice", None)
            .await
            .expect("resolve should succeed");

        assert_eq!(id, 1);
        let users = store.users.lock().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.get("a@x.com").unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn test_repeat_sign_in_is_insert_only() {
        let store = Arc::new(MockUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let first = resolver.resolve("a@x.com", "Alice", None).await.unwrap();
        // Display name changed at the provider; stored name must not move.
        let second = resolver
            .resolve("a@x.com", "Alice Renamed", None)
            .await
            .unwrap();

        assert_eq!(first, second);
        let users = store.users.lock().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users.get("a@x.com").unwrap().name, "Alice");
    }

    #[tokio::test]
    async fn test_lost_race_rereads_winning_row() {
        let store = Arc::new(MockUserStore::with_racing_insert());
        let resolver = IdentityResolver::new(store.clone());

        let id = resolver
            .resolve("a@x.com", "Alice", None)
            .await
            .expect("conflict must resolve internally");

        assert_eq!(id, 1);
        assert_eq!(store.users.lock().unwrap().len(), 1);
        // Conflict is never surfaced: a second resolve sees the same row.
        let again = resolver.resolve("a@x.com", "Alice", None).await.unwrap();
        assert_eq!(again, id);
    }

    #[tokio::test]
    async fn test_empty_email_rejected() {
        let store = Arc::new(MockUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let err = resolver.resolve("", "Alice", None).await.unwrap_err();
        assert!(matches!(err, IdentityError::EmptyEmail));
        assert!(store.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_email_match_is_case_sensitive() {
        let store = Arc::new(MockUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let lower = resolver.resolve("a@x.com", "Alice", None).await.unwrap();
        let upper = resolver.resolve("A@x.com", "Alice", None).await.unwrap();

        // Exact-match comparison: a differently-cased email is a new identity.
        assert_ne!(lower, upper);
        assert_eq!(store.users.lock().unwrap().len(), 2);
    }
}
