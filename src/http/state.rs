use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::session::{InterviewSession, SessionConfig, SessionDeps, TimeBudget};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Live interview sessions (session_id → session)
    pub sessions: Arc<RwLock<HashMap<String, Arc<InterviewSession>>>>,

    /// Collaborators handed to every new session
    pub deps: SessionDeps,

    /// Answer budget applied to new sessions
    pub time_budget: TimeBudget,
}

impl AppState {
    pub fn new(deps: SessionDeps, time_budget: TimeBudget) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            deps,
            time_budget,
        }
    }

    pub fn session_config(&self, session_id: String) -> SessionConfig {
        SessionConfig {
            session_id,
            time_budget: self.time_budget,
        }
    }

    /// Live session by id, rehydrating it from storage on first access
    pub async fn find_session(&self, session_id: &str) -> Result<Option<Arc<InterviewSession>>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return Ok(Some(Arc::clone(session)));
        }

        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get(session_id) {
            return Ok(Some(Arc::clone(session)));
        }

        let config = self.session_config(session_id.to_string());
        let restored = InterviewSession::restore(config, self.deps.clone()).await?;
        if let Some(session) = &restored {
            sessions.insert(session_id.to_string(), Arc::clone(session));
        }

        Ok(restored)
    }
}
