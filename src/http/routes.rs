use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route(
            "/interviews",
            post(handlers::create_interview).get(handlers::list_interviews),
        )
        .route(
            "/interviews/:session_id",
            get(handlers::get_interview).delete(handlers::delete_interview),
        )
        // Controller operations
        .route(
            "/interviews/:session_id/start",
            post(handlers::start_interview),
        )
        .route(
            "/interviews/:session_id/answer",
            post(handlers::submit_answer),
        )
        .route(
            "/interviews/:session_id/expire",
            post(handlers::expire_timer),
        )
        .route(
            "/interviews/:session_id/reset",
            post(handlers::reset_interview),
        )
        // Stateless question service
        .route("/questions/next", post(handlers::next_question))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
