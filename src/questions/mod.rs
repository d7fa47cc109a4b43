//! Question acquisition
//!
//! This module produces the next interview step:
//! - Prompt construction for the remote language model
//! - The remote call itself (OpenAI-compatible chat completions)
//! - Lenient parsing of the model's JSON reply
//! - A deterministic question bank used whenever the above fails

mod bank;
pub mod messages;
mod model;
mod service;

pub use bank::{BankEntry, QuestionBank};
pub use messages::{ModelReply, NextStepRequest, Progress};
pub use model::{ChatCompletionsModel, QuestionModel, QuestionServiceError};
pub use service::{
    build_prompt, QuestionService, QuestionStep, StepSource, COMPLETION_MESSAGE, DEFAULT_QUESTION,
    TIME_EXPIRED_ANSWER,
};
