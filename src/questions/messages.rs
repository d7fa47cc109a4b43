use serde::{Deserialize, Serialize};

use crate::session::Difficulty;

/// Progress sent along with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub question_count: usize,
    pub score: f64,
}

/// Request to the question service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextStepRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    pub current_state: Progress,
}

/// Structured reply expected from the model. Every field is optional on
/// the wire; missing values are filled in by the service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelReply {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
    #[serde(default)]
    pub is_complete: Option<bool>,
    #[serde(default)]
    pub completion_message: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

impl ModelReply {
    /// Difficulty label if it names a known level
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.difficulty.as_deref().and_then(|d| d.parse().ok())
    }
}

/// Remove markdown code fences (```json ... ```) the model tends to add
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Parse a raw model reply into a [`ModelReply`].
///
/// Fences are stripped first. If the remainder is not a JSON object, the
/// outermost `{...}` span is tried before giving up.
pub fn parse_reply(raw: &str) -> Result<ModelReply, serde_json::Error> {
    let cleaned = strip_code_fences(raw);

    match serde_json::from_str::<ModelReply>(&cleaned) {
        Ok(reply) => Ok(reply),
        Err(e) => match (cleaned.find('{'), cleaned.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str(&cleaned[start..=end])
            }
            _ => Err(e),
        },
    }
}

// ============================================================================
// OpenAI-compatible chat completions
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}
