use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::clock::{elapsed_secs, Clock};
use super::config::{SessionConfig, QUESTIONS_PER_SESSION};
use super::state::{Difficulty, InterviewResponse, ResumeDocument, SessionState};
use super::stats::{average_time_secs, SessionPhase, SessionSummary};
use super::storage::StateStorage;
use super::store::SessionStore;
use super::timer::{TickOutcome, TickTarget, Ticker};
use crate::questions::{NextStepRequest, Progress, QuestionService, TIME_EXPIRED_ANSWER};

/// Collaborators shared by every session
#[derive(Clone)]
pub struct SessionDeps {
    pub service: Arc<QuestionService>,
    pub storage: Arc<dyn StateStorage>,
    pub ticker: Arc<dyn Ticker>,
    pub clock: Arc<dyn Clock>,
}

/// Result of a controller operation
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// An exchange completed and was recorded
    Recorded(InterviewResponse),
    /// The operation is not valid in the current phase; nothing changed
    Ignored(SessionPhase),
}

struct Inner {
    store: SessionStore,
    phase: SessionPhase,
    /// Bumped on reset so a step that was in flight is discarded
    epoch: u64,
}

/// Answer being evaluated, with the timing of the question it answers
struct PendingAnswer {
    text: String,
    difficulty: Difficulty,
    time_taken: u32,
    time_allotted: u32,
}

/// One interview: six exchanges, each with a countdown.
///
/// Only one exchange is evaluated at a time. While a request to the
/// question service is in flight the session is `Evaluating` and every
/// other operation except `reset` is ignored.
pub struct InterviewSession {
    config: SessionConfig,
    deps: SessionDeps,
    inner: Mutex<Inner>,
    me: Weak<InterviewSession>,
}

impl InterviewSession {
    /// Create a new, idle session. Any stored record under the same id is
    /// overwritten.
    pub fn new(config: SessionConfig, deps: SessionDeps) -> Arc<Self> {
        info!("Creating interview session: {}", config.session_id);

        let store = SessionStore::new(config.session_id.clone(), Arc::clone(&deps.storage));
        Self::with_store(config, deps, store, SessionPhase::Idle)
    }

    /// Rehydrate a session from storage. A question that was on screen
    /// resumes counting down from the persisted remaining time.
    pub async fn restore(config: SessionConfig, deps: SessionDeps) -> Result<Option<Arc<Self>>> {
        let Some(state) = deps.storage.load(&config.session_id)? else {
            return Ok(None);
        };

        let phase = phase_for(&state);
        info!(
            "Restoring interview session {} at exchange {} ({:?})",
            config.session_id, state.question_count, phase
        );

        let store = SessionStore::rehydrate(config.session_id.clone(), state, Arc::clone(&deps.storage));
        let session = Self::with_store(config, deps, store, phase);

        let expired = {
            let mut inner = session.inner.lock().await;
            let was_running = inner.store.state().is_timer_running;
            let awaiting = phase == SessionPhase::AwaitingAnswer;
            let remaining = inner.store.state().time_remaining;

            inner.store.batch(|store| {
                store.stop_timer();
                if awaiting && remaining > 0 {
                    session.start_countdown(store);
                }
            });

            if !awaiting && was_running {
                warn!(
                    "Session {} had a running timer but no question to answer",
                    session.id()
                );
            }
            awaiting && remaining == 0
        };

        // Saved after the countdown hit zero but before the expiry exchange ran
        if expired {
            info!("Session {}: countdown ran out before reload", session.id());
            session.timer_expired().await;
        }

        Ok(Some(session))
    }

    fn with_store(
        config: SessionConfig,
        deps: SessionDeps,
        store: SessionStore,
        phase: SessionPhase,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            config,
            deps,
            inner: Mutex::new(Inner {
                store,
                phase,
                epoch: 0,
            }),
            me: me.clone(),
        })
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub async fn phase(&self) -> SessionPhase {
        self.inner.lock().await.phase
    }

    pub async fn state(&self) -> SessionState {
        self.inner.lock().await.store.state().clone()
    }

    pub async fn is_complete(&self) -> bool {
        self.inner.lock().await.store.is_complete()
    }

    pub async fn score_formatted(&self) -> String {
        self.inner.lock().await.store.score_formatted()
    }

    /// Whether a tick source is currently attached to the countdown
    pub async fn has_tick_source(&self) -> bool {
        self.inner.lock().await.store.has_tick_source()
    }

    pub async fn summary(&self) -> SessionSummary {
        let inner = self.inner.lock().await;
        let state = inner.store.state();

        SessionSummary {
            session_id: self.config.session_id.clone(),
            phase: inner.phase,
            is_complete: inner.store.is_complete(),
            has_active_interview: inner.store.has_active_interview(),
            score_formatted: inner.store.score_formatted(),
            average_time_secs: average_time_secs(state),
            state: state.clone(),
        }
    }

    pub async fn set_candidate_name(&self, name: Option<String>) {
        self.inner.lock().await.store.set_candidate_name(name);
    }

    /// Attach an uploaded resume and its extracted text. Only the text is
    /// persisted.
    pub async fn attach_resume(&self, document: Option<ResumeDocument>, text: String) {
        let mut inner = self.inner.lock().await;
        inner.store.attach_resume(document);
        inner.store.set_resume_text(text);
    }

    /// Fetch the opening question. Only valid while idle.
    pub async fn start(&self) -> Transition {
        let (progress, epoch) = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::Idle {
                warn!("Session {}: start ignored while {:?}", self.id(), inner.phase);
                return Transition::Ignored(inner.phase);
            }

            inner.phase = SessionPhase::Evaluating;
            (progress_of(inner.store.state()), inner.epoch)
        };

        info!("Starting interview session: {}", self.id());
        self.run_exchange(None, progress, epoch).await
    }

    /// Submit an answer to the question on screen. Blank answers are ignored.
    pub async fn submit(&self, answer: &str) -> Transition {
        let answer = answer.trim();
        if answer.is_empty() {
            let phase = self.phase().await;
            warn!("Session {}: empty answer ignored", self.id());
            return Transition::Ignored(phase);
        }

        self.answer(answer.to_string(), false).await
    }

    /// The countdown ran out: submit the no-answer sentinel, charged the
    /// full allotted time.
    pub async fn timer_expired(&self) -> Transition {
        self.answer(TIME_EXPIRED_ANSWER.to_string(), true).await
    }

    /// Return to idle from any phase. A step still in flight is discarded
    /// when it arrives.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.store.reset();
        inner.phase = SessionPhase::Idle;
        inner.epoch += 1;
    }

    /// Stop the countdown and delete the stored record. A step still in
    /// flight is discarded when it arrives.
    pub async fn discard(&self) {
        let mut inner = self.inner.lock().await;
        inner.store.discard();
        inner.phase = SessionPhase::Idle;
        inner.epoch += 1;
    }

    /// Advance the countdown by one second, handling expiry
    pub async fn tick(&self) -> TickOutcome {
        let outcome = self.inner.lock().await.store.tick();

        if outcome == TickOutcome::Expired {
            info!("Session {}: time's up", self.id());
            self.timer_expired().await;
        }
        outcome
    }

    async fn answer(&self, text: String, expired: bool) -> Transition {
        let (pending, progress, epoch) = {
            let mut inner = self.inner.lock().await;
            if inner.phase != SessionPhase::AwaitingAnswer {
                warn!(
                    "Session {}: answer ignored while {:?}",
                    self.id(),
                    inner.phase
                );
                return Transition::Ignored(inner.phase);
            }

            inner.phase = SessionPhase::Evaluating;
            inner.store.stop_timer();

            let state = inner.store.state();
            let difficulty = state.current_difficulty;
            let time_allotted = self.config.time_budget.for_difficulty(difficulty);
            let time_taken = if expired {
                time_allotted
            } else {
                state
                    .question_started_at
                    .map(|at| elapsed_secs(self.deps.clock.as_ref(), at))
                    .unwrap_or(0)
            };

            let pending = PendingAnswer {
                text,
                difficulty,
                time_taken,
                time_allotted,
            };
            (pending, progress_of(state), inner.epoch)
        };

        info!(
            "Session {}: evaluating answer {} ({}s of {}s)",
            self.id(),
            progress.question_count,
            pending.time_taken,
            pending.time_allotted
        );

        self.run_exchange(Some(pending), progress, epoch).await
    }

    async fn run_exchange(
        &self,
        pending: Option<PendingAnswer>,
        progress: Progress,
        epoch: u64,
    ) -> Transition {
        let request = NextStepRequest {
            user_answer: pending.as_ref().map(|p| p.text.clone()),
            current_state: progress,
        };
        let step = self.deps.service.next_step(&request).await;

        let mut inner = self.inner.lock().await;
        if inner.epoch != epoch {
            warn!(
                "Session {}: discarding step that arrived after reset",
                self.id()
            );
            return Transition::Ignored(inner.phase);
        }

        let response = inner.store.batch(|store| {
            let response = match &pending {
                Some(answer) => {
                    let delta = store.apply_score_delta(
                        step.is_correct,
                        Some(answer.time_taken),
                        Some(answer.time_allotted),
                    );
                    info!(
                        "Session {}: answer correct={} earned {:.2}",
                        self.id(),
                        step.is_correct,
                        delta
                    );

                    InterviewResponse {
                        question: step.question.clone(),
                        feedback: step.feedback.clone(),
                        is_correct: step.is_correct,
                        difficulty: Some(answer.difficulty),
                        time_allotted: Some(answer.time_allotted),
                        time_taken: Some(answer.time_taken),
                        completion_message: step.completion_message.clone(),
                    }
                }
                None => InterviewResponse {
                    question: step.question.clone(),
                    feedback: step.feedback.clone(),
                    is_correct: step.is_correct,
                    difficulty: Some(step.difficulty),
                    time_allotted: None,
                    time_taken: None,
                    completion_message: step.completion_message.clone(),
                },
            };

            store.record_response(response.clone());

            if store.is_complete() {
                store.clear_current_question();
            } else {
                let seconds = self.config.time_budget.for_difficulty(step.difficulty);
                store.set_current_difficulty(step.difficulty);
                store.arm_timer(seconds);
                self.start_countdown(store);
                store.mark_question_started(self.deps.clock.now());
            }
            response
        });

        if inner.store.is_complete() {
            inner.phase = SessionPhase::Complete;
            info!(
                "Interview session {} complete: {}",
                self.id(),
                inner.store.score_formatted()
            );
        } else {
            inner.phase = SessionPhase::AwaitingAnswer;
        }

        Transition::Recorded(response)
    }

    fn start_countdown(&self, store: &mut SessionStore) {
        let target: Weak<dyn TickTarget> = self.me.clone();
        let ticker = Arc::clone(&self.deps.ticker);
        store.start_timer(move || ticker.spawn(target));
    }
}

#[async_trait]
impl TickTarget for InterviewSession {
    async fn on_tick(&self) -> bool {
        matches!(self.tick().await, TickOutcome::Running(_))
    }
}

fn progress_of(state: &SessionState) -> Progress {
    Progress {
        question_count: state.question_count,
        score: state.score,
    }
}

/// Phase implied by a persisted record
fn phase_for(state: &SessionState) -> SessionPhase {
    if state.question_count >= QUESTIONS_PER_SESSION {
        SessionPhase::Complete
    } else if state.question_count == 0 {
        SessionPhase::Idle
    } else {
        SessionPhase::AwaitingAnswer
    }
}
