//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::session::session_middleware};

pub mod auth;
pub mod health;
pub mod posts;
pub mod users;

/// Creates the API router with public and session-protected routes.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Routes that require a session token
    let protected_routes = Router::new()
        .merge(auth::session_routes())
        .merge(posts::protected_routes())
        .merge(users::protected_routes())
        .layer(middleware::from_fn_with_state(state, session_middleware));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(posts::public_routes())
        .merge(users::public_routes())
        .merge(protected_routes)
}
