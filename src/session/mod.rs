//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - Question progression through six exchanges of escalating difficulty
//! - The per-question countdown and its tick source
//! - Time-weighted scoring
//! - Persistence of session state across reloads

mod clock;
mod config;
mod scoring;
mod session;
mod state;
mod stats;
mod storage;
mod store;
mod timer;

pub use clock::{elapsed_secs, Clock, ManualClock, SystemClock};
pub use config::{SessionConfig, TimeBudget, QUESTIONS_PER_SESSION};
pub use scoring::{score, time_bonus};
pub use session::{InterviewSession, SessionDeps, Transition};
pub use state::{Difficulty, InterviewResponse, ResumeDocument, SessionState};
pub use stats::{average_time_secs, SessionPhase, SessionSummary};
pub use storage::{validate_key, JsonFileStorage, MemoryStorage, StateStorage};
pub use store::SessionStore;
pub use timer::{
    CountdownTimer, IntervalTicker, ManualTicker, TickHandle, TickOutcome, TickTarget, Ticker,
    TimerSnapshot,
};
