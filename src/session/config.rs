use serde::{Deserialize, Serialize};

use super::state::Difficulty;

/// Number of exchanges in one interview; the session is complete once
/// this many responses have been recorded
pub const QUESTIONS_PER_SESSION: usize = 6;

/// Seconds allotted to answer a question of each difficulty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBudget {
    pub easy_secs: u32,
    pub medium_secs: u32,
    pub hard_secs: u32,
}

impl Default for TimeBudget {
    fn default() -> Self {
        Self {
            easy_secs: 20,
            medium_secs: 60,
            hard_secs: 120,
        }
    }
}

impl TimeBudget {
    pub fn for_difficulty(&self, difficulty: Difficulty) -> u32 {
        match difficulty {
            Difficulty::Easy => self.easy_secs,
            Difficulty::Medium => self.medium_secs,
            Difficulty::Hard => self.hard_secs,
        }
    }
}

/// Configuration for an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique session identifier, also the storage key
    pub session_id: String,

    /// Answer budget per difficulty
    pub time_budget: TimeBudget,
}

impl SessionConfig {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            time_budget: TimeBudget::default(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(format!("interview-{}", uuid::Uuid::new_v4()))
    }
}
