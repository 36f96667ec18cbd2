//! Post management routes.
//!
//! Mutations accept `multipart/form-data` so a thumbnail image can
//! ride along with the text fields in one request.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::CurrentUser};
use inkpost_core::post::{
    ImageUpload, Post, PostError, PostInput, PostService, PostStatus,
    PostRepository as PostRepoTrait,
};
use inkpost_core::storage::StorageError;
use inkpost_db::PostRepository;

/// Body limit for multipart mutations; the per-file cap is enforced
/// separately by the storage service.
const MULTIPART_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Creates the public post routes.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts))
        .route("/posts/{id}", get(get_post))
}

/// Creates the session-protected post routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route("/posts/{id}", put(update_post))
        .route("/posts/{id}", delete(delete_post))
        .layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Response for a post.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: i64,
    /// Post title.
    pub title: String,
    /// URL slug, if any.
    pub slug: Option<String>,
    /// Post body.
    pub content: String,
    /// Public thumbnail URL, if any.
    pub thumbnail_url: Option<String>,
    /// Publication status.
    pub status: String,
    /// Owning user ID.
    pub user_id: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Updated at timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            thumbnail_url: post.thumbnail_url,
            status: post.status.as_str().to_string(),
            user_id: post.owner_user_id,
            created_at: post.created_at.to_rfc3339(),
            updated_at: post.updated_at.to_rfc3339(),
        }
    }
}

/// Parsed multipart form for a post mutation.
#[derive(Debug, Default)]
struct PostForm {
    title: String,
    content: String,
    slug: Option<String>,
    status: Option<String>,
    image: Option<ImageUpload>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Treat empty strings as absent optional fields.
fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Read the multipart form into its fields.
///
/// A file part with no filename or no bytes counts as "no image"; form
/// clients send such parts when the picker was left empty.
async fn read_post_form(multipart: &mut Multipart) -> Result<PostForm, Response> {
    let mut form = PostForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "invalid_form",
                "message": format!("malformed multipart body: {e}")
            })),
        )
            .into_response()
    })? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = read_text(field).await?,
            "content" => form.content = read_text(field).await?,
            "slug" => form.slug = non_empty(read_text(field).await?),
            "status" => form.status = non_empty(read_text(field).await?),
            "thumbnail" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map_err(read_error)?;

                if !filename.is_empty() && !bytes.is_empty() {
                    form.image = Some(ImageUpload {
                        filename,
                        content_type,
                        bytes,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, Response> {
    field.text().await.map_err(read_error)
}

fn read_error(e: axum::extract::multipart::MultipartError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "success": false,
            "error": "invalid_form",
            "message": format!("failed to read form field: {e}")
        })),
    )
        .into_response()
}

/// Convert the parsed form into service input, rejecting unknown
/// status values before any I/O.
fn build_input(form: PostForm) -> Result<(PostInput, Option<ImageUpload>), Response> {
    let status = match form.status.as_deref() {
        None => None,
        Some(raw) => match PostStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "success": false,
                        "error": "validation_error",
                        "message": format!("unknown status value: {raw}")
                    })),
                )
                    .into_response());
            }
        },
    };

    let input = PostInput {
        title: form.title,
        content: form.content,
        slug: form.slug,
        status,
    };

    Ok((input, form.image))
}

/// Map a post service error to an HTTP response.
fn post_error_response(e: &PostError) -> Response {
    match e {
        PostError::Validation(msg) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "error": "validation_error",
                "message": msg
            })),
        )
            .into_response(),
        PostError::NotFound(_) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "success": false,
                "error": "not_found",
                "message": "Post not found"
            })),
        )
            .into_response(),
        PostError::Storage(storage_err) if storage_err.is_validation() => {
            let code = match storage_err {
                StorageError::FileTooLarge { .. } => "file_too_large",
                _ => "invalid_content_type",
            };
            (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": code,
                    "message": storage_err.to_string()
                })),
            )
                .into_response()
        }
        PostError::Storage(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "storage_error",
                "message": "Storage operation failed"
            })),
        )
            .into_response(),
        PostError::Repository(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

fn post_service(state: &AppState) -> PostService<PostRepository> {
    let repo = PostRepository::new((*state.db).clone());
    PostService::new(state.storage.clone(), Arc::new(repo))
}

/// Load a post and verify the caller owns it.
async fn check_ownership(
    service: &PostService<impl PostRepoTrait>,
    post_id: i64,
    user_id: i64,
) -> Result<(), Response> {
    match service.get_post(post_id).await {
        Ok(post) if post.owner_user_id == user_id => Ok(()),
        Ok(_) => Err((
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "error": "forbidden",
                "message": "You do not own this post"
            })),
        )
            .into_response()),
        Err(e) => Err(post_error_response(&e)),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET /posts
/// List all posts, newest first.
async fn list_posts(State(state): State<AppState>) -> impl IntoResponse {
    let service = post_service(&state);

    match service.list_posts().await {
        Ok(posts) => {
            let items: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
            (StatusCode::OK, Json(json!({ "success": true, "posts": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to list posts");
            post_error_response(&e)
        }
    }
}

/// GET /posts/{id}
/// Fetch a single post.
async fn get_post(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let service = post_service(&state);

    match service.get_post(id).await {
        Ok(found) => (
            StatusCode::OK,
            Json(json!({ "success": true, "post": PostResponse::from(found) })),
        )
            .into_response(),
        Err(e) => post_error_response(&e),
    }
}

/// POST /posts
/// Create a post, optionally with a thumbnail image.
async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_post_form(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let (input, image) = match build_input(form) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let service = post_service(&state);

    match service.create_post(input, user.user_id(), image).await {
        Ok(created) => {
            info!(post_id = created.id, user_id = user.user_id(), "post created");
            (
                StatusCode::CREATED,
                Json(json!({ "success": true, "post": PostResponse::from(created) })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to create post");
            post_error_response(&e)
        }
    }
}

/// PUT /posts/{id}
/// Overwrite a post; the thumbnail is only replaced when a new image
/// is part of the form.
async fn update_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let form = match read_post_form(&mut multipart).await {
        Ok(form) => form,
        Err(response) => return response,
    };
    let (input, image) = match build_input(form) {
        Ok(parts) => parts,
        Err(response) => return response,
    };

    let service = post_service(&state);

    if let Err(response) = check_ownership(&service, id, user.user_id()).await {
        return response;
    }

    match service.update_post(id, input, image).await {
        Ok(updated) => {
            info!(post_id = id, user_id = user.user_id(), "post updated");
            (
                StatusCode::OK,
                Json(json!({ "success": true, "post": PostResponse::from(updated) })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to update post");
            post_error_response(&e)
        }
    }
}

/// DELETE /posts/{id}
/// Delete a post; its thumbnail blob stays in object storage.
async fn delete_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let service = post_service(&state);

    if let Err(response) = check_ownership(&service, id, user.user_id()).await {
        return response;
    }

    match service.delete_post(id).await {
        Ok(()) => {
            info!(post_id = id, user_id = user.user_id(), "post deleted");
            (StatusCode::OK, Json(json!({ "success": true }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to delete post");
            post_error_response(&e)
        }
    }
}
