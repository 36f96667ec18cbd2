//! Health check route.

use axum::{Json, Router, routing::get};
use serde_json::json;

use crate::AppState;

/// Creates the health check routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// GET /health
/// Liveness probe; does not touch the datastore.
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "inkpost",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
