use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::bank::QuestionBank;
use super::messages::{parse_reply, ModelReply, NextStepRequest, Progress};
use super::model::{QuestionModel, QuestionServiceError};
use crate::session::{Difficulty, QUESTIONS_PER_SESSION};

/// Answer submitted on the candidate's behalf when the countdown runs out
pub const TIME_EXPIRED_ANSWER: &str = "[Time Expired - No Answer Provided]";

/// Shown whenever a question is needed but none could be produced
pub const DEFAULT_QUESTION: &str = "What are the key features of React?";

pub const COMPLETION_MESSAGE: &str = "Thank you for completing the technical interview! \
Your responses have been recorded and will be reviewed by our team.";

const FALLBACK_FEEDBACK: &str =
    "Thank you for your answer. Let's continue with the next question.";

/// Where a step came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepSource {
    Remote,
    Fallback,
}

/// Evaluation of the last answer plus what to show next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionStep {
    pub question: Option<String>,
    pub feedback: String,
    pub is_correct: bool,
    pub is_complete: bool,
    pub completion_message: Option<String>,
    pub difficulty: Difficulty,
    pub source: StepSource,
}

/// Adapter over the remote model.
///
/// `next_step` always produces a usable step: transport failures, timeouts
/// and malformed replies all degrade to [`QuestionService::fallback_step`].
pub struct QuestionService {
    model: Arc<dyn QuestionModel>,
    bank: QuestionBank,
    request_timeout: Option<Duration>,
}

impl QuestionService {
    pub fn new(model: Arc<dyn QuestionModel>) -> Self {
        Self {
            model,
            bank: QuestionBank::new(),
            request_timeout: None,
        }
    }

    /// Bound each remote call; on expiry the fallback is used
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub async fn next_step(&self, request: &NextStepRequest) -> QuestionStep {
        let answer = request.user_answer.as_deref();
        let progress = request.current_state;

        match self.remote_step(answer, progress).await {
            Ok(step) => step,
            Err(e) => {
                warn!(
                    "Question model {} unavailable at exchange {}: {} - using fallback",
                    self.model.name(),
                    progress.question_count + 1,
                    e
                );
                self.fallback_step(answer, progress)
            }
        }
    }

    /// Deterministic step from the question bank, used when the model
    /// cannot be
    pub fn fallback_step(&self, answer: Option<&str>, progress: Progress) -> QuestionStep {
        let is_last = is_last_question(progress);
        let entry = self.bank.fallback_for(progress.question_count);

        let step = QuestionStep {
            question: (!is_last).then(|| entry.question.to_string()),
            feedback: if answer.is_some() {
                FALLBACK_FEEDBACK.to_string()
            } else {
                String::new()
            },
            is_correct: answer == Some(TIME_EXPIRED_ANSWER),
            is_complete: is_last,
            completion_message: is_last.then(|| COMPLETION_MESSAGE.to_string()),
            difficulty: entry.difficulty,
            source: StepSource::Fallback,
        };

        ensure_question(step)
    }

    async fn remote_step(
        &self,
        answer: Option<&str>,
        progress: Progress,
    ) -> Result<QuestionStep, QuestionServiceError> {
        let target = Difficulty::for_question_count(progress.question_count);
        let prompt = build_prompt(answer, progress, target);

        let raw = match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.model.complete(&prompt))
                .await
                .map_err(|_| QuestionServiceError::Timeout(limit))??,
            None => self.model.complete(&prompt).await?,
        };

        let reply = parse_reply(&raw)?;
        Ok(self.step_from_reply(reply, progress, target))
    }

    fn step_from_reply(&self, reply: ModelReply, progress: Progress, target: Difficulty) -> QuestionStep {
        let is_last = is_last_question(progress);

        if reply.is_complete.unwrap_or(false) != is_last {
            info!(
                "Model reported isComplete={:?} at exchange {}; completion follows question count",
                reply.is_complete,
                progress.question_count + 1
            );
        }

        let difficulty = reply.difficulty().unwrap_or(target);

        let step = QuestionStep {
            question: if is_last { None } else { reply.question },
            feedback: reply.feedback.unwrap_or_default(),
            is_correct: reply.is_correct.unwrap_or(false),
            is_complete: is_last,
            completion_message: if is_last {
                reply
                    .completion_message
                    .filter(|m| !m.trim().is_empty())
                    .or_else(|| Some(COMPLETION_MESSAGE.to_string()))
            } else {
                None
            },
            difficulty,
            source: StepSource::Remote,
        };

        ensure_question(step)
    }
}

/// The sixth exchange is terminal
fn is_last_question(progress: Progress) -> bool {
    progress.question_count + 1 >= QUESTIONS_PER_SESSION
}

/// An unfinished session must always have something to ask
fn ensure_question(mut step: QuestionStep) -> QuestionStep {
    let missing = step
        .question
        .as_deref()
        .map_or(true, |q| q.trim().is_empty());

    if !step.is_complete && missing {
        step.question = Some(DEFAULT_QUESTION.to_string());
    }
    step
}

/// Instruction for the model: evaluate `answer` (if any) and produce the
/// next question, or the completion message on the final exchange
pub fn build_prompt(answer: Option<&str>, progress: Progress, difficulty: Difficulty) -> String {
    let is_last = is_last_question(progress);

    let task = match answer {
        Some(answer) => format!(
            "The candidate answered: \"{}\". Evaluate if this answer is correct and provide brief constructive feedback.",
            answer
        ),
        None => "Ask the next technical question about web development.".to_string(),
    };

    let final_note = if is_last {
        "This is the FINAL question. After evaluating the answer, provide a completion message and end the interview."
    } else {
        ""
    };

    let completion = if is_last {
        format!("\"{}\"", COMPLETION_MESSAGE)
    } else {
        "null".to_string()
    };

    format!(
        r#"You are a technical interviewer conducting a web development interview.

{task}

Current Progress: Question {number} of {total}
Difficulty Level: {difficulty}
{final_note}

Rules:
- If this is the first request (no answer), provide an EASY question about basic web development
- If an answer was provided, evaluate it honestly and provide the next question
- Questions should progress in difficulty: easy -> medium -> hard
- Technical topics: HTML, CSS, JavaScript, React, Node.js, APIs, etc.
- After the {total}th question, mark as complete
- Return the difficulty level with each question

Response Format (JSON only):
{{
  "question": "the next question or null if interview is complete",
  "feedback": "brief feedback on the answer if provided, otherwise empty string",
  "isCorrect": true/false,
  "isComplete": {is_last},
  "difficulty": "{difficulty}",
  "completionMessage": {completion}
}}"#,
        task = task,
        number = progress.question_count + 1,
        total = QUESTIONS_PER_SESSION,
        difficulty = difficulty,
        final_note = final_note,
        is_last = is_last,
        completion = completion,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(question_count: usize) -> Progress {
        Progress {
            question_count,
            score: 0.0,
        }
    }

    #[test]
    fn test_prompt_without_answer_asks_for_question() {
        let prompt = build_prompt(None, progress(0), Difficulty::Easy);
        assert!(prompt.contains("Ask the next technical question"));
        assert!(prompt.contains("Question 1 of 6"));
        assert!(prompt.contains("Difficulty Level: easy"));
        assert!(prompt.contains("\"isComplete\": false"));
        assert!(!prompt.contains("FINAL question"));
    }

    #[test]
    fn test_prompt_on_last_exchange_requests_completion() {
        let prompt = build_prompt(Some("Use JWTs"), progress(5), Difficulty::Hard);
        assert!(prompt.contains("The candidate answered: \"Use JWTs\""));
        assert!(prompt.contains("FINAL question"));
        assert!(prompt.contains("\"isComplete\": true"));
        assert!(prompt.contains(COMPLETION_MESSAGE));
    }

    #[test]
    fn test_ensure_question_fills_blank() {
        let step = ensure_question(QuestionStep {
            question: Some("   ".to_string()),
            feedback: String::new(),
            is_correct: false,
            is_complete: false,
            completion_message: None,
            difficulty: Difficulty::Easy,
            source: StepSource::Remote,
        });
        assert_eq!(step.question.as_deref(), Some(DEFAULT_QUESTION));
    }

    #[test]
    fn test_ensure_question_leaves_completed_step_empty() {
        let step = ensure_question(QuestionStep {
            question: None,
            feedback: String::new(),
            is_correct: true,
            is_complete: true,
            completion_message: Some(COMPLETION_MESSAGE.to_string()),
            difficulty: Difficulty::Hard,
            source: StepSource::Remote,
        });
        assert_eq!(step.question, None);
    }
}
