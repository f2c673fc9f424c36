//! Axum router configuration for all endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use super::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard
        .route("/", get(handlers::index))
        .route("/urls", get(handlers::list_urls))
        .route("/data", get(handlers::url_data))
        .route("/url", get(handlers::url_details))
        .route("/static/style.css", get(handlers::stylesheet))
        // Fetchers
        .route("/insights", post(handlers::run_insights))
        .route("/run", get(handlers::run_performance))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
