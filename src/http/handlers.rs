use super::state::AppState;
use crate::questions::{NextStepRequest, QuestionStep};
use crate::session::{
    validate_key, InterviewResponse, InterviewSession, SessionPhase, SessionSummary, Transition,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct CreateInterviewRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Display name read from the candidate's resume
    pub candidate_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerRequest {
    pub answer: String,
}

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub session_id: String,
    pub response: InterviewResponse,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<SessionPhase>,
}

fn error_response(status: StatusCode, error: String, phase: Option<SessionPhase>) -> Response {
    (status, Json(ErrorResponse { error, phase })).into_response()
}

fn not_found(session_id: &str) -> Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} not found", session_id),
        None,
    )
}

async fn lookup(state: &AppState, session_id: &str) -> Result<Arc<InterviewSession>, Response> {
    match state.find_session(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found(session_id)),
        Err(e) => {
            error!("Failed to load interview {}: {:#}", session_id, e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to load interview: {}", e),
                None,
            ))
        }
    }
}

async fn transition_response(session: &InterviewSession, transition: Transition) -> Response {
    match transition {
        Transition::Recorded(response) => (
            StatusCode::OK,
            Json(ExchangeResponse {
                session_id: session.id().to_string(),
                response,
                summary: session.summary().await,
            }),
        )
            .into_response(),
        Transition::Ignored(phase) => error_response(
            StatusCode::CONFLICT,
            format!("Operation not allowed while {:?}", phase),
            Some(phase),
        ),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews
/// Create a session and fetch its opening question
pub async fn create_interview(
    State(state): State<AppState>,
    Json(req): Json<CreateInterviewRequest>,
) -> Response {
    let session_id = req
        .session_id
        .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4()));

    if let Err(e) = validate_key(&session_id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string(), None);
    }

    info!("Creating interview: {}", session_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Interview {} is already running", session_id),
                None,
            );
        }

        let session =
            InterviewSession::new(state.session_config(session_id.clone()), state.deps.clone());
        sessions.insert(session_id.clone(), Arc::clone(&session));
        session
    };

    if req.candidate_name.is_some() {
        session.set_candidate_name(req.candidate_name).await;
    }

    let transition = session.start().await;
    transition_response(&session, transition).await
}

/// GET /interviews
/// Summaries of all live sessions
pub async fn list_interviews(State(state): State<AppState>) -> impl IntoResponse {
    let sessions: Vec<Arc<InterviewSession>> =
        state.sessions.read().await.values().cloned().collect();

    let summaries =
        futures::future::join_all(sessions.iter().map(|session| session.summary())).await;

    (StatusCode::OK, Json(summaries))
}

/// GET /interviews/:session_id
pub async fn get_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match lookup(&state, &session_id).await {
        Ok(session) => (StatusCode::OK, Json(session.summary().await)).into_response(),
        Err(response) => response,
    }
}

/// DELETE /interviews/:session_id
/// Stop the interview and delete its stored record
pub async fn delete_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session = match lookup(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    state.sessions.write().await.remove(&session_id);
    session.discard().await;
    info!("Interview {} deleted", session_id);

    StatusCode::NO_CONTENT.into_response()
}

/// POST /interviews/:session_id/start
/// Fetch the opening question of an idle interview (after a reset, or one
/// rehydrated before it was started)
pub async fn start_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session = match lookup(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let transition = session.start().await;
    transition_response(&session, transition).await
}

/// POST /interviews/:session_id/answer
pub async fn submit_answer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Response {
    let session = match lookup(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let transition = session.submit(&req.answer).await;
    transition_response(&session, transition).await
}

/// POST /interviews/:session_id/expire
/// Report that the countdown reached zero on the client
pub async fn expire_timer(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session = match lookup(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let transition = session.timer_expired().await;
    transition_response(&session, transition).await
}

/// POST /interviews/:session_id/reset
pub async fn reset_interview(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let session = match lookup(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    session.reset().await;
    info!("Interview {} reset", session_id);

    (StatusCode::OK, Json(session.summary().await)).into_response()
}

/// POST /questions/next
/// Evaluate an answer and get the next step without a session
pub async fn next_question(
    State(state): State<AppState>,
    Json(req): Json<NextStepRequest>,
) -> Json<QuestionStep> {
    Json(state.deps.service.next_step(&req).await)
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
