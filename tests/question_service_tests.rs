// Tests for the question service adapter
//
// These verify that every failure mode of the remote model degrades to
// the fallback bank and that the service always yields a usable step.

use async_trait::async_trait;
use mock_interview::questions::{
    NextStepRequest, Progress, QuestionModel, QuestionService, QuestionServiceError, StepSource,
    COMPLETION_MESSAGE, DEFAULT_QUESTION, TIME_EXPIRED_ANSWER,
};
use mock_interview::session::Difficulty;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Model that answers every prompt with the same canned text (or error)
struct CannedModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl CannedModel {
    fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl QuestionModel for CannedModel {
    async fn complete(&self, prompt: &str) -> Result<String, QuestionServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().ok_or(QuestionServiceError::Status(503))
    }

    fn name(&self) -> &str {
        "canned"
    }
}

/// Model that never replies
struct HangingModel;

#[async_trait]
impl QuestionModel for HangingModel {
    async fn complete(&self, _prompt: &str) -> Result<String, QuestionServiceError> {
        std::future::pending().await
    }

    fn name(&self) -> &str {
        "hanging"
    }
}

fn request(answer: Option<&str>, question_count: usize) -> NextStepRequest {
    NextStepRequest {
        user_answer: answer.map(str::to_string),
        current_state: Progress {
            question_count,
            score: 0.0,
        },
    }
}

#[tokio::test]
async fn test_remote_reply_is_used() {
    let model = CannedModel::replying(
        r#"```json
{"question": "What is event delegation?", "feedback": "Right, const cannot be reassigned.", "isCorrect": true, "isComplete": false, "difficulty": "easy", "completionMessage": null}
```"#,
    );
    let service = QuestionService::new(model.clone());

    let step = service.next_step(&request(Some("const is block scoped"), 1)).await;

    assert_eq!(step.source, StepSource::Remote);
    assert_eq!(step.question.as_deref(), Some("What is event delegation?"));
    assert_eq!(step.feedback, "Right, const cannot be reassigned.");
    assert!(step.is_correct);
    assert!(!step.is_complete);
    assert_eq!(step.difficulty, Difficulty::Easy);
    assert!(model.last_prompt().contains("const is block scoped"));
}

#[tokio::test]
async fn test_transport_failure_falls_back_to_bank() {
    let service = QuestionService::new(CannedModel::failing());

    let opening = service.next_step(&request(None, 0)).await;
    assert_eq!(opening.source, StepSource::Fallback);
    assert_eq!(
        opening.question.as_deref(),
        Some("What is the difference between let, const, and var in JavaScript?")
    );
    assert_eq!(opening.feedback, "");
    assert!(!opening.is_correct);
    assert_eq!(opening.difficulty, Difficulty::Easy);

    let third = service.next_step(&request(Some("flexbox aligns items"), 2)).await;
    assert_eq!(third.difficulty, Difficulty::Medium);
    assert!(!third.is_correct);
    assert!(third.feedback.contains("Thank you for your answer"));
}

#[tokio::test]
async fn test_unparseable_reply_falls_back() {
    let service = QuestionService::new(CannedModel::replying("Sorry, I can't help with that."));

    let step = service.next_step(&request(Some("answer"), 3)).await;

    assert_eq!(step.source, StepSource::Fallback);
    assert_eq!(
        step.question.as_deref(),
        Some("How would you optimize website performance for faster loading?")
    );
}

#[tokio::test]
async fn test_expired_answer_fallback_counts_as_correct() {
    let service = QuestionService::new(CannedModel::failing());
    let step = service.next_step(&request(Some(TIME_EXPIRED_ANSWER), 1)).await;
    assert!(step.is_correct);
}

#[tokio::test]
async fn test_last_exchange_completes_without_question() {
    let service = QuestionService::new(CannedModel::failing());

    let step = service.next_step(&request(Some("answer"), 5)).await;

    assert!(step.is_complete);
    assert_eq!(step.question, None);
    assert_eq!(step.completion_message.as_deref(), Some(COMPLETION_MESSAGE));
}

#[tokio::test]
async fn test_remote_completion_message_defaults() {
    let service = QuestionService::new(CannedModel::replying(
        r#"{"question": null, "feedback": "Nice.", "isCorrect": true, "isComplete": true}"#,
    ));

    let step = service.next_step(&request(Some("answer"), 5)).await;

    assert_eq!(step.source, StepSource::Remote);
    assert!(step.is_complete);
    assert_eq!(step.completion_message.as_deref(), Some(COMPLETION_MESSAGE));
}

#[tokio::test]
async fn test_missing_question_is_replaced() {
    let service = QuestionService::new(CannedModel::replying(
        r#"{"question": "", "feedback": "ok", "isCorrect": false, "isComplete": false}"#,
    ));

    let step = service.next_step(&request(Some("answer"), 2)).await;

    assert!(!step.is_complete);
    assert_eq!(step.question.as_deref(), Some(DEFAULT_QUESTION));
    assert_eq!(step.difficulty, Difficulty::Medium, "Missing difficulty uses the target");
}

#[tokio::test]
async fn test_early_completion_claim_is_not_honored() {
    let service = QuestionService::new(CannedModel::replying(
        r#"{"question": null, "feedback": "Done!", "isCorrect": true, "isComplete": true}"#,
    ));

    let step = service.next_step(&request(Some("answer"), 1)).await;

    assert!(!step.is_complete);
    assert_eq!(step.question.as_deref(), Some(DEFAULT_QUESTION));
}

#[tokio::test(start_paused = true)]
async fn test_request_deadline_falls_back() {
    let service = QuestionService::new(Arc::new(HangingModel))
        .with_request_timeout(Some(Duration::from_secs(10)));

    let step = service.next_step(&request(None, 0)).await;

    assert_eq!(step.source, StepSource::Fallback);
    assert!(step.question.is_some());
}

#[test]
fn test_fallback_is_available_directly() {
    let service = QuestionService::new(CannedModel::failing());
    let progress = Progress {
        question_count: 4,
        score: 2.0,
    };

    let step = service.fallback_step(Some("answer"), progress);

    assert_eq!(step.source, StepSource::Fallback);
    assert_eq!(step.difficulty, Difficulty::Hard);
    assert_eq!(
        step.question.as_deref(),
        Some("Explain the concept of closures in JavaScript with a practical example.")
    );
}

#[test]
fn test_fallback_out_of_range_wraps() {
    let service = QuestionService::new(CannedModel::failing());

    // Past the end of the bank: still terminal, difficulty from the first entry
    let step = service.fallback_step(None, Progress { question_count: 9, score: 0.0 });
    assert!(step.is_complete);
    assert_eq!(step.difficulty, Difficulty::Easy);
}
