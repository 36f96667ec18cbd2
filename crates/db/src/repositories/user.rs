//! User repository for database operations.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::entities::users;
use inkpost_core::identity::{IdentityError, NewUser, UserRecord, UserStore};

/// User repository implementation.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl UserStore for UserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, IdentityError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(|e| IdentityError::repository(e.to_string()))?;

        Ok(model.map(to_domain))
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, IdentityError> {
        let active_model = users::ActiveModel {
            name: Set(user.name),
            email: Set(user.email),
            picture: Set(user.picture),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                IdentityError::Conflict
            } else {
                IdentityError::repository(e.to_string())
            }
        })?;

        Ok(to_domain(model))
    }
}

/// Convert database model to domain record.
fn to_domain(model: users::Model) -> UserRecord {
    UserRecord {
        id: model.id,
        name: model.name,
        email: model.email,
        picture: model.picture,
        created_at: model.created_at.with_timezone(&chrono::Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_domain_maps_all_fields() {
        let now = chrono::Utc::now();
        let model = users::Model {
            id: 7,
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            picture: Some("https://cdn.example.com/a.png".to_string()),
            created_at: now.into(),
        };

        let record = to_domain(model);
        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Alice");
        assert_eq!(record.email, "a@x.com");
        assert_eq!(
            record.picture.as_deref(),
            Some("https://cdn.example.com/a.png")
        );
        assert_eq!(record.created_at, now);
    }
}
