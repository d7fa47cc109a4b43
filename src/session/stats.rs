use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Where a session is in the question/answer cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// No exchange yet
    Idle,
    /// A question is shown and its countdown is running
    AwaitingAnswer,
    /// A request to the question service is in flight
    Evaluating,
    /// All exchanges recorded
    Complete,
}

/// Read-only view of a session for presentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,

    pub phase: SessionPhase,

    pub is_complete: bool,

    /// Started and not yet complete
    pub has_active_interview: bool,

    /// `"<score>/<questionCount>"`
    pub score_formatted: String,

    /// Mean seconds per exchange, rounded
    pub average_time_secs: u32,

    pub state: SessionState,
}

/// Total time spent divided by exchanges completed, rounded to whole seconds
pub fn average_time_secs(state: &SessionState) -> u32 {
    if state.question_count == 0 {
        return 0;
    }
    (f64::from(state.total_time_taken) / state.question_count as f64).round() as u32
}
