//! HTTP API for the presentation layer
//!
//! This module provides a REST API over interview sessions:
//! - POST /interviews - Create a session and fetch its first question
//! - GET /interviews - Summaries of live sessions
//! - GET /interviews/:id - Session state and derived values
//! - DELETE /interviews/:id - Stop a session and delete its record
//! - POST /interviews/:id/start - Fetch the opening question of an idle session
//! - POST /interviews/:id/answer - Submit an answer
//! - POST /interviews/:id/expire - Report countdown expiry
//! - POST /interviews/:id/reset - Reset to idle
//! - POST /questions/next - Ask the question service directly
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
