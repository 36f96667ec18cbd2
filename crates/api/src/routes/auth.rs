//! Sign-in and session routes.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::{AppState, middleware::SessionUser};
use inkpost_core::identity::{IdentityError, IdentityResolver};
use inkpost_db::UserRepository;

/// Creates the public auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/auth/signin", post(sign_in))
}

/// Creates the session-protected auth routes.
pub fn session_routes() -> Router<AppState> {
    Router::new().route("/auth/session", get(get_session))
}

/// Request body for sign-in, carrying the provider-verified profile.
#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    /// Verified email address.
    pub email: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Avatar URL, if any.
    #[serde(default)]
    pub picture: Option<String>,
}

/// POST /auth/signin
/// Resolve a provider-verified profile to a durable user and issue a
/// session token.
///
/// Any resolution failure denies the sign-in; a session is never
/// issued without a backing user row.
async fn sign_in(
    State(state): State<AppState>,
    Json(payload): Json<SignInRequest>,
) -> impl IntoResponse {
    let store = Arc::new(UserRepository::new((*state.db).clone()));
    let resolver = IdentityResolver::new(store);

    let user_id = match resolver
        .resolve(&payload.email, &payload.name, payload.picture.clone())
        .await
    {
        Ok(id) => id,
        Err(IdentityError::EmptyEmail) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": "validation_error",
                    "message": "email is required"
                })),
            )
                .into_response();
        }
        Err(e) => {
            error!(error = %e, "sign-in denied: identity resolution failed");
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "error": "signin_failed",
                    "message": "Sign-in could not be completed"
                })),
            )
                .into_response();
        }
    };

    match state
        .tokens
        .issue(&payload.email, &payload.name, payload.picture.clone())
    {
        Ok(token) => {
            info!(user_id, "user signed in");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "token": token,
                    "expires_in": state.tokens.session_expires_in(),
                    "user": {
                        "id": user_id,
                        "email": payload.email,
                        "name": payload.name,
                        "picture": payload.picture,
                    }
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "failed to issue session token");
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

/// GET /auth/session
/// Return the enriched session for the current token.
///
/// `user_id` is null when enrichment degraded; the session itself
/// stays valid.
async fn get_session(SessionUser(session): SessionUser) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "session": {
            "email": session.email,
            "name": session.name,
            "picture": session.picture,
            "user_id": session.user_id,
        }
    }))
}
