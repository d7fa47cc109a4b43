use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::config::QUESTIONS_PER_SESSION;
use super::scoring;
use super::state::{Difficulty, InterviewResponse, ResumeDocument, SessionState};
use super::storage::StateStorage;
use super::timer::{CountdownTimer, TickHandle, TickOutcome, TimerSnapshot};

/// Owner of a session's state and countdown.
///
/// Every mutation goes through this type and is written to storage before
/// returning, or at the end of the enclosing [`SessionStore::batch`].
/// Storage failures are logged, never raised.
pub struct SessionStore {
    key: String,
    state: SessionState,
    timer: CountdownTimer,
    storage: Arc<dyn StateStorage>,
    /// Nesting depth of open batches
    batch_depth: usize,
    /// A write was deferred by an open batch
    dirty: bool,
}

impl SessionStore {
    /// Fresh, empty session
    pub fn new(key: impl Into<String>, storage: Arc<dyn StateStorage>) -> Self {
        let mut store = Self {
            key: key.into(),
            state: SessionState::default(),
            timer: CountdownTimer::new(),
            storage,
            batch_depth: 0,
            dirty: false,
        };
        store.persist();
        store
    }

    /// Rebuild from a persisted record. The countdown comes back with its
    /// remaining time but no tick source.
    pub fn rehydrate(
        key: impl Into<String>,
        state: SessionState,
        storage: Arc<dyn StateStorage>,
    ) -> Self {
        let timer = CountdownTimer::from_snapshot(TimerSnapshot {
            time_remaining: state.time_remaining,
            is_running: state.is_timer_running,
        });

        Self {
            key: key.into(),
            state: SessionState {
                resume_document: None,
                ..state
            },
            timer,
            storage,
            batch_depth: 0,
            dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state.question_count >= QUESTIONS_PER_SESSION
    }

    /// Responses exist and the interview is not finished
    pub fn has_active_interview(&self) -> bool {
        !self.state.responses.is_empty() && !self.is_complete()
    }

    /// `"<score>/<questionCount>"`
    pub fn score_formatted(&self) -> String {
        let score = (self.state.score * 100.0).round() / 100.0;
        format!("{}/{}", score, self.state.question_count)
    }

    pub fn has_tick_source(&self) -> bool {
        self.timer.has_tick_source()
    }

    /// Append one exchange and advance progress by exactly one
    pub fn record_response(&mut self, response: InterviewResponse) {
        self.state.current_question = response.question.clone();
        self.state.responses.push(response);
        self.state.question_count += 1;

        debug!(
            "Session {}: recorded exchange {}",
            self.key, self.state.question_count
        );
        self.persist();
    }

    /// Add the score for one answer; timing also accumulates total time
    pub fn apply_score_delta(
        &mut self,
        is_correct: bool,
        time_taken: Option<u32>,
        time_allotted: Option<u32>,
    ) -> f64 {
        let delta = scoring::score(is_correct, time_taken, time_allotted);
        self.state.score += delta;

        if let (Some(taken), Some(_)) = (time_taken, time_allotted) {
            self.state.total_time_taken = self.state.total_time_taken.saturating_add(taken);
        }

        self.persist();
        delta
    }

    pub fn set_current_difficulty(&mut self, difficulty: Difficulty) {
        self.state.current_difficulty = difficulty;
        self.persist();
    }

    pub fn mark_question_started(&mut self, at: DateTime<Utc>) {
        self.state.question_started_at = Some(at);
        self.persist();
    }

    pub fn clear_current_question(&mut self) {
        self.state.current_question = None;
        self.state.question_started_at = None;
        self.persist();
    }

    pub fn set_candidate_name(&mut self, name: Option<String>) {
        self.state.candidate_name = name;
        self.persist();
    }

    pub fn set_resume_text(&mut self, text: String) {
        self.state.resume_text = text;
        self.persist();
    }

    /// Attach the uploaded document. It lives in memory only.
    pub fn attach_resume(&mut self, document: Option<ResumeDocument>) {
        self.state.resume_document = document;
    }

    pub fn arm_timer(&mut self, seconds: u32) {
        self.timer.arm(seconds);
        self.sync_timer();
    }

    pub fn start_timer(&mut self, spawn: impl FnOnce() -> TickHandle) -> bool {
        let started = self.timer.start(spawn);
        if started {
            self.sync_timer();
        }
        started
    }

    pub fn stop_timer(&mut self) {
        self.timer.stop();
        self.sync_timer();
    }

    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.timer.tick();
        if outcome != TickOutcome::Idle {
            self.sync_timer();
        }
        outcome
    }

    /// Run several mutations with a single write at the end
    pub fn batch<R>(&mut self, mutate: impl FnOnce(&mut Self) -> R) -> R {
        self.batch_depth += 1;
        let result = mutate(self);
        self.batch_depth -= 1;

        if self.batch_depth == 0 && self.dirty {
            self.dirty = false;
            self.write();
        }
        result
    }

    /// Cancel the countdown and delete the stored record
    pub fn discard(&mut self) {
        self.timer = CountdownTimer::new();
        self.state = SessionState::default();
        self.dirty = false;

        if let Err(e) = self.storage.remove(&self.key) {
            error!("Failed to remove session {}: {:#}", self.key, e);
        }
        info!("Session {} discarded", self.key);
    }

    /// Cancel the countdown and return to the empty initial state
    pub fn reset(&mut self) {
        self.timer = CountdownTimer::new();
        self.state = SessionState::default();

        info!("Session {} reset", self.key);
        self.persist();
    }

    fn sync_timer(&mut self) {
        let snapshot = self.timer.snapshot();
        self.state.time_remaining = snapshot.time_remaining;
        self.state.is_timer_running = snapshot.is_running;
        self.persist();
    }

    fn persist(&mut self) {
        if self.batch_depth > 0 {
            self.dirty = true;
        } else {
            self.write();
        }
    }

    fn write(&self) {
        if let Err(e) = self.storage.save(&self.key, &self.state) {
            error!("Failed to persist session {}: {:#}", self.key, e);
        }
    }
}
