//! Router configuration for the import API.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/imports",
            get(handlers::import_history).post(handlers::start_import),
        )
        .route("/api/imports/:id/batches", post(handlers::process_batch))
        .route("/api/imports/:id/progress", get(handlers::import_progress))
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
