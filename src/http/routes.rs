use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Streaming control
        .route("/stream/start", post(handlers::start_stream))
        .route("/stream/stop", post(handlers::stop_stream))
        .route("/stream/mode", put(handlers::set_mode))
        .route("/stream/language", put(handlers::set_language))
        .route("/stream/gloss", post(handlers::send_gloss))
        // Session queries
        .route("/stream/status", get(handlers::get_status))
        .route("/stream/words", get(handlers::get_words))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
