//! Session middleware for authenticated routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::AppState;
use inkpost_core::session::{Session, SessionEnricher};
use inkpost_db::UserRepository;
use inkpost_shared::TokenError;

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Session middleware for routes that need a signed-in caller.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates the token and builds the session from its claims
/// 3. Enriches the session with the durable user id (degrading
///    gracefully when the lookup fails)
/// 4. Stores the session in request extensions for handlers to access
pub async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "error": "missing_token",
                "message": "Authorization header with Bearer token is required"
            })),
        )
            .into_response();
    };

    match state.tokens.validate(token) {
        Ok(claims) => {
            let session = Session::new(claims.sub, claims.name, claims.picture);

            // Attach the durable user id on every session read. A
            // failed lookup leaves the session unenriched; owner-only
            // handlers reject it, read-only handlers keep working.
            let store = Arc::new(UserRepository::new((*state.db).clone()));
            let session = SessionEnricher::new(store).enrich(session).await;

            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(e) => {
            let (error, message) = match e {
                TokenError::Expired => ("token_expired", "Session token has expired"),
                _ => ("invalid_token", "Invalid or malformed session token"),
            };

            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "success": false, "error": error, "message": message })),
            )
                .into_response()
        }
    }
}

/// Extractor for the request session, enriched or not.
///
/// Use this in handlers that only need the verified profile.
#[derive(Debug, Clone)]
pub struct SessionUser(pub Session);

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .map(SessionUser)
            .ok_or_else(missing_session)
    }
}

/// Extractor for a session whose durable user id is resolved.
///
/// Owner-only actions require this; a session without a user id
/// (identity not yet resolved, or enrichment degraded) is rejected
/// with 401 rather than crashing downstream.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    session: Session,
    user_id: i64,
}

impl CurrentUser {
    /// Returns the durable user id.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns the session email.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.session.email
    }

    /// Returns the underlying session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(missing_session)?;

        let Some(user_id) = session.user_id else {
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "success": false,
                    "error": "identity_not_resolved",
                    "message": "No user record is associated with this session"
                })),
            )
                .into_response());
        };

        Ok(Self { session, user_id })
    }
}

fn missing_session() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "success": false,
            "error": "missing_session",
            "message": "This route requires a session"
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token("abc123"), None);
    }
}
