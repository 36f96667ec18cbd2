//! Post repository for database operations.
//!
//! Implements post CRUD operations using SeaORM.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set,
};

use crate::entities::posts;
use inkpost_core::post::{
    NewPostRecord, Post, PostError, PostRepository as PostRepoTrait, PostStatus, PostUpdateRecord,
};

/// Post repository implementation.
#[derive(Debug, Clone)]
pub struct PostRepository {
    db: DatabaseConnection,
}

impl PostRepository {
    /// Creates a new post repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl PostRepoTrait for PostRepository {
    async fn insert(&self, record: NewPostRecord) -> Result<Post, PostError> {
        let now = Utc::now();
        let active_model = posts::ActiveModel {
            title: Set(record.title),
            slug: Set(record.slug),
            content: Set(record.content),
            thumbnail_url: Set(record.thumbnail_url),
            status: Set(record.status.as_str().to_string()),
            user_id: Set(record.owner_user_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        to_domain(model)
    }

    async fn update(&self, id: i64, record: PostUpdateRecord) -> Result<Option<Post>, PostError> {
        // Single full-row UPDATE; updated_at is refreshed by the
        // datastore trigger.
        let active_model = posts::ActiveModel {
            id: Set(id),
            title: Set(record.title),
            slug: Set(record.slug),
            content: Set(record.content),
            thumbnail_url: Set(record.thumbnail_url),
            status: Set(record.status.as_str().to_string()),
            ..Default::default()
        };

        match active_model.update(&self.db).await {
            Ok(model) => to_domain(model).map(Some),
            Err(DbErr::RecordNotUpdated) => Ok(None),
            Err(e) => Err(PostError::repository(e.to_string())),
        }
    }

    async fn delete(&self, id: i64) -> Result<bool, PostError> {
        let result = posts::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, PostError> {
        let model = posts::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn list(&self) -> Result<Vec<Post>, PostError> {
        let models = posts::Entity::find()
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }

    async fn list_by_owner(&self, owner_user_id: i64) -> Result<Vec<Post>, PostError> {
        let models = posts::Entity::find()
            .filter(posts::Column::UserId.eq(owner_user_id))
            .order_by_desc(posts::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| PostError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }
}

/// Convert database model to domain model.
fn to_domain(model: posts::Model) -> Result<Post, PostError> {
    let status = PostStatus::parse(&model.status)
        .ok_or_else(|| PostError::repository(format!("invalid status value: {}", model.status)))?;

    Ok(Post {
        id: model.id,
        title: model.title,
        slug: model.slug,
        content: model.content,
        thumbnail_url: model.thumbnail_url,
        status,
        owner_user_id: model.user_id,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn model(status: &str) -> posts::Model {
        let now = chrono::Utc::now();
        posts::Model {
            id: 1,
            title: "Hello".to_string(),
            slug: Some("hello".to_string()),
            content: "World".to_string(),
            thumbnail_url: None,
            status: status.to_string(),
            user_id: 7,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[rstest]
    #[case("draft", PostStatus::Draft)]
    #[case("published", PostStatus::Published)]
    fn test_to_domain_status(#[case] raw: &str, #[case] expected: PostStatus) {
        let post = to_domain(model(raw)).unwrap();
        assert_eq!(post.status, expected);
        assert_eq!(post.owner_user_id, 7);
    }

    #[test]
    fn test_to_domain_rejects_unknown_status() {
        let err = to_domain(model("archived")).unwrap_err();
        assert!(matches!(err, PostError::Repository(_)));
    }
}
