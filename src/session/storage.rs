use anyhow::{anyhow, bail, Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

use super::state::SessionState;

/// Durable home for the persisted part of a session, one record per key.
///
/// Calls are synchronous and made while the owning session is locked; the
/// store batches them so each controller operation writes at most once.
pub trait StateStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<SessionState>>;

    fn save(&self, key: &str, state: &SessionState) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per session under a directory
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {}", dir.display()))?;

        info!("Session storage at {}", dir.display());

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<SessionState>> {
        let path = self.record_path(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        let state = serde_json::from_slice(&bytes)
            .with_context(|| format!("Corrupt session record {}", path.display()))?;

        Ok(Some(state))
    }

    fn save(&self, key: &str, state: &SessionState) -> Result<()> {
        let path = self.record_path(key)?;
        let tmp = path.with_extension("json.tmp");

        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(&tmp, bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key)?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// In-process storage; records still go through JSON
#[derive(Debug, Default)]
pub struct MemoryStorage {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records
            .lock()
            .map(|records| records.contains_key(key))
            .unwrap_or(false)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<SessionState>> {
        let records = self
            .records
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?;

        records
            .get(key)
            .map(|json| serde_json::from_str(json).context("Corrupt session record"))
            .transpose()
    }

    fn save(&self, key: &str, state: &SessionState) -> Result<()> {
        let json = serde_json::to_string(state)?;
        self.records
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?
            .insert(key.to_string(), json);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("storage lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

/// Keys become file names, so only ASCII letters, digits, `-` and `_` are
/// allowed, up to 128 characters
pub fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key.len() <= 128
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if !valid {
        bail!("Invalid session key: {:?}", key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::{Difficulty, InterviewResponse, ResumeDocument};
    use tempfile::TempDir;

    fn sample_state() -> SessionState {
        SessionState {
            responses: vec![InterviewResponse {
                question: Some("Explain CSS specificity.".to_string()),
                feedback: "Good.".to_string(),
                is_correct: true,
                difficulty: Some(Difficulty::Easy),
                time_allotted: Some(20),
                time_taken: Some(8),
                completion_message: None,
            }],
            question_count: 1,
            score: 1.0,
            current_difficulty: Difficulty::Easy,
            time_remaining: 14,
            is_timer_running: true,
            total_time_taken: 8,
            current_question: Some("Explain CSS specificity.".to_string()),
            candidate_name: Some("Sam".to_string()),
            resume_document: Some(ResumeDocument {
                file_name: "resume.pdf".to_string(),
                bytes: vec![0x25, 0x50, 0x44, 0x46],
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_file_storage_roundtrip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = JsonFileStorage::new(temp_dir.path().join("sessions"))?;
        let state = sample_state();

        storage.save("interview-1", &state)?;
        let loaded = storage.load("interview-1")?.expect("record should exist");

        assert_eq!(loaded, state.persisted());
        assert!(loaded.resume_document.is_none());
        assert!(temp_dir.path().join("sessions/interview-1.json").exists());
        Ok(())
    }

    #[test]
    fn test_file_storage_missing_and_remove() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let storage = JsonFileStorage::new(temp_dir.path())?;

        assert!(storage.load("nobody")?.is_none());

        storage.save("someone", &SessionState::default())?;
        storage.remove("someone")?;
        assert!(storage.load("someone")?.is_none());
        storage.remove("someone")?;
        Ok(())
    }

    #[test]
    fn test_rejects_path_like_keys() {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonFileStorage::new(temp_dir.path()).unwrap();

        assert!(storage.save("../escape", &SessionState::default()).is_err());
        assert!(storage.load("").is_err());
    }

    #[test]
    fn test_memory_storage_roundtrip() -> Result<()> {
        let storage = MemoryStorage::new();
        let state = sample_state();

        storage.save("a", &state)?;
        assert!(storage.contains("a"));
        assert_eq!(storage.load("a")?, Some(state.persisted()));
        Ok(())
    }
}
