use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target complexity of a question; also selects its answer budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Difficulty progression by exchange index: 0-1 easy, 2-3 medium, 4+ hard
    pub fn for_question_count(question_count: usize) -> Self {
        match question_count {
            0..=1 => Difficulty::Easy,
            2..=3 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {}", other)),
        }
    }
}

/// One completed question/answer exchange
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewResponse {
    /// Next question to show; `None` once the interview has ended
    pub question: Option<String>,

    /// Feedback on the submitted answer (empty for the opening exchange)
    pub feedback: String,

    pub is_correct: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    /// Present only for exchanges that carried a user answer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_allotted: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_taken: Option<u32>,

    pub completion_message: Option<String>,
}

/// Uploaded resume kept in memory only. It cannot be persisted and is
/// always absent after a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Canonical mutable record for one interview
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// Append-only exchange log
    pub responses: Vec<InterviewResponse>,

    /// Exchanges completed so far; always equals `responses.len()`
    pub question_count: usize,

    /// Accumulated fractional points
    pub score: f64,

    pub current_difficulty: Difficulty,

    pub time_remaining: u32,

    pub is_timer_running: bool,

    /// Seconds spent across all answered questions
    pub total_time_taken: u32,

    #[serde(default)]
    pub current_question: Option<String>,

    /// When the current question was shown
    #[serde(default)]
    pub question_started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub candidate_name: Option<String>,

    #[serde(default)]
    pub resume_text: String,

    #[serde(skip)]
    pub resume_document: Option<ResumeDocument>,
}

impl SessionState {
    /// Copy of this state without transient resources, i.e. what survives a reload
    pub fn persisted(&self) -> Self {
        Self {
            resume_document: None,
            ..self.clone()
        }
    }
}
