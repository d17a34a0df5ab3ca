//! API route definitions

use axum::routing::get;
use axum::routing::post;
use axum::Router;

use super::handlers::AppState;
use super::handlers::{
    self,
};

/// Create RESTful API router
pub fn api_routes(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Reply suggestions
        .route("/replies", post(handlers::create_replies))
        .route(
            "/conversations/:id/drafts",
            get(handlers::get_cached_drafts),
        )
        .with_state(state)
}
