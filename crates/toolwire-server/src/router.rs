use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::app_state::AppState;
use crate::handlers;

/// Path requests are posted to; announced to clients on each stream.
pub const MESSAGES_PATH: &str = "/messages";

/// Create the main application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/", get(handlers::health))
        .route("/health", get(handlers::health))
        // One event stream per channel; responses arrive here
        .route("/sse/{channel}", get(handlers::channel_sse))
        // Requests, addressed by the session id announced on the stream
        .route(MESSAGES_PATH, post(handlers::post_message))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
