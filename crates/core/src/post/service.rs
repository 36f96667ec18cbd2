//! Post persistence service implementation.

use std::sync::Arc;

use tracing::info;

use super::error::PostError;
use super::types::{ImageUpload, NewPostRecord, Post, PostInput, PostUpdateRecord};
use crate::storage::StorageService;

/// Maximum title length in characters.
const MAX_TITLE_CHARS: usize = 255;

/// Object storage namespace for post thumbnails.
const THUMBNAIL_NAMESPACE: &str = "post_thumbnails";

/// Repository trait for post persistence.
///
/// This trait is implemented by the db crate to provide actual database
/// operations. `update` and `delete` must surface "zero rows affected"
/// distinctly (as `None` / `false`) from a driver error.
pub trait PostRepository: Send + Sync {
    /// Insert a new post row; the datastore assigns the id.
    fn insert(
        &self,
        record: NewPostRecord,
    ) -> impl std::future::Future<Output = Result<Post, PostError>> + Send;

    /// Overwrite all mutable columns of a post; `None` if the id does
    /// not exist.
    fn update(
        &self,
        id: i64,
        record: PostUpdateRecord,
    ) -> impl std::future::Future<Output = Result<Option<Post>, PostError>> + Send;

    /// Delete a post row; `false` if the id does not exist.
    fn delete(&self, id: i64)
    -> impl std::future::Future<Output = Result<bool, PostError>> + Send;

    /// Find a post by id.
    fn find_by_id(
        &self,
        id: i64,
    ) -> impl std::future::Future<Output = Result<Option<Post>, PostError>> + Send;

    /// List all posts, newest first.
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Post>, PostError>> + Send;

    /// List posts owned by a user, newest first.
    fn list_by_owner(
        &self,
        owner_user_id: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, PostError>> + Send;
}

/// Post persistence service.
///
/// Orchestrates validation, conditional thumbnail upload, and the row
/// write. No lock spans the upload and the write: a crash in between
/// can orphan a blob but never produces a row pointing at a missing
/// blob, because the row write only happens after upload success.
pub struct PostService<R: PostRepository> {
    storage: Arc<StorageService>,
    repo: Arc<R>,
}

impl<R: PostRepository> PostService<R> {
    /// Create a new post service.
    #[must_use]
    pub fn new(storage: Arc<StorageService>, repo: Arc<R>) -> Self {
        Self { storage, repo }
    }

    /// Validate required fields before any I/O.
    fn validate(input: &PostInput) -> Result<(), PostError> {
        if input.title.is_empty() {
            return Err(PostError::validation("title is required"));
        }
        if input.title.chars().count() > MAX_TITLE_CHARS {
            return Err(PostError::validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        if input.content.is_empty() {
            return Err(PostError::validation("content is required"));
        }
        Ok(())
    }

    /// Upload a thumbnail image and return its public URL.
    async fn upload_thumbnail(&self, image: ImageUpload) -> Result<String, PostError> {
        let url = self
            .storage
            .upload(
                image.bytes,
                THUMBNAIL_NAMESPACE,
                &image.filename,
                &image.content_type,
            )
            .await?;
        Ok(url)
    }

    /// Create a post owned by `owner_user_id`.
    ///
    /// Creation is all-or-nothing: if an image was supplied and its
    /// upload fails, no row is created.
    ///
    /// # Errors
    ///
    /// Returns a validation error (no side effects performed) for
    /// missing fields or a non-image blob, otherwise storage or
    /// repository errors.
    pub async fn create_post(
        &self,
        input: PostInput,
        owner_user_id: i64,
        image: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        Self::validate(&input)?;

        let thumbnail_url = match image {
            Some(image) => Some(self.upload_thumbnail(image).await?),
            None => None,
        };

        let record = NewPostRecord {
            title: input.title,
            slug: input.slug,
            content: input.content,
            thumbnail_url,
            status: input.status.unwrap_or_default(),
            owner_user_id,
        };

        let post = self.repo.insert(record).await?;
        info!(post_id = post.id, owner_user_id, "post created");
        Ok(post)
    }

    /// Update a post by overwriting every mutable column.
    ///
    /// This is a full replace, not a sparse patch: callers relying on
    /// "leave unspecified fields untouched" must resend the current
    /// values. The one exception is the thumbnail - when no new image
    /// is supplied, the existing URL is carried forward rather than
    /// nulled out. A new image that fails to upload fails the whole
    /// update; there is no silent fallback to the previous image.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` for an unknown id, a validation
    /// error for bad fields, or storage/repository errors.
    pub async fn update_post(
        &self,
        post_id: i64,
        input: PostInput,
        image: Option<ImageUpload>,
    ) -> Result<Post, PostError> {
        Self::validate(&input)?;

        let existing = self
            .repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound(post_id))?;

        let thumbnail_url = match image {
            Some(image) => Some(self.upload_thumbnail(image).await?),
            None => existing.thumbnail_url,
        };

        let record = PostUpdateRecord {
            title: input.title,
            slug: input.slug,
            content: input.content,
            thumbnail_url,
            status: input.status.unwrap_or_default(),
        };

        let post = self
            .repo
            .update(post_id, record)
            .await?
            .ok_or(PostError::NotFound(post_id))?;
        info!(post_id, "post updated");
        Ok(post)
    }

    /// Delete a post.
    ///
    /// The associated thumbnail blob is left in object storage;
    /// orphan cleanup is a separate concern.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` if no row was deleted.
    pub async fn delete_post(&self, post_id: i64) -> Result<(), PostError> {
        if !self.repo.delete(post_id).await? {
            return Err(PostError::NotFound(post_id));
        }
        info!(post_id, "post deleted");
        Ok(())
    }

    /// Get a post by id.
    ///
    /// # Errors
    ///
    /// Returns `PostError::NotFound` for an unknown id.
    pub async fn get_post(&self, post_id: i64) -> Result<Post, PostError> {
        self.repo
            .find_by_id(post_id)
            .await?
            .ok_or(PostError::NotFound(post_id))
    }

    /// List all posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_posts(&self) -> Result<Vec<Post>, PostError> {
        self.repo.list().await
    }

    /// List posts owned by a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list_posts_by_owner(&self, owner_user_id: i64) -> Result<Vec<Post>, PostError> {
        self.repo.list_by_owner(owner_user_id).await
    }
}
