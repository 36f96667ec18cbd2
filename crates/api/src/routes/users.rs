//! User profile routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use tracing::error;

use crate::{AppState, middleware::CurrentUser};
use crate::routes::posts::PostResponse;
use inkpost_core::identity::UserStore;
use inkpost_core::post::{PostRepository as PostRepoTrait, PostService};
use inkpost_db::{PostRepository, UserRepository};

/// Creates the public user routes.
pub fn public_routes() -> Router<AppState> {
    Router::new().route("/users/{id}/posts", get(list_user_posts))
}

/// Creates the session-protected user routes.
pub fn protected_routes() -> Router<AppState> {
    Router::new().route("/profile", get(get_profile))
}

/// GET /users/{id}/posts
/// List posts owned by a user, newest first.
async fn list_user_posts(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let repo = Arc::new(PostRepository::new((*state.db).clone()));
    let service = PostService::new(state.storage.clone(), repo);

    match service.list_posts_by_owner(id).await {
        Ok(posts) => {
            let items: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
            (StatusCode::OK, Json(json!({ "success": true, "posts": items }))).into_response()
        }
        Err(e) => {
            error!(error = %e, user_id = id, "failed to list user posts");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response()
        }
    }
}

/// GET /profile
/// Return the caller's user record together with their posts.
async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    let user_repo = UserRepository::new((*state.db).clone());

    let record = match user_repo.find_by_email(user.email()).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "success": false,
                    "error": "not_found",
                    "message": "User record not found"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "failed to load profile");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let post_repo = PostRepository::new((*state.db).clone());
    let posts = match post_repo.list_by_owner(record.id).await {
        Ok(posts) => posts,
        Err(e) => {
            error!(error = %e, user_id = record.id, "failed to list profile posts");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": "internal_error",
                    "message": "An error occurred"
                })),
            )
                .into_response();
        }
    };

    let items: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user": {
                "id": record.id,
                "email": record.email,
                "name": record.name,
                "picture": record.picture,
                "created_at": record.created_at.to_rfc3339(),
            },
            "posts": items,
        })),
    )
        .into_response()
}
