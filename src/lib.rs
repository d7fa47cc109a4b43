pub mod config;
pub mod http;
pub mod questions;
pub mod session;

pub use config::Config;
pub use http::{create_router, AppState};
pub use questions::{
    ChatCompletionsModel, NextStepRequest, Progress, QuestionBank, QuestionModel,
    QuestionService, QuestionServiceError, QuestionStep,
};
pub use session::{
    Difficulty, InterviewResponse, InterviewSession, SessionConfig, SessionDeps, SessionPhase,
    SessionState, SessionSummary, Transition,
};
