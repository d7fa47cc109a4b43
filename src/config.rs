use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::session::TimeBudget;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub question_service: QuestionServiceConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub timing: TimingConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Remote language model used to generate and grade questions
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionServiceConfig {
    /// OpenAI-compatible base URL (e.g. "https://api.groq.com/openai/v1")
    pub base_url: String,

    /// Model identifier passed in the request body
    pub model: String,

    /// Name of the environment variable holding the API key
    pub api_key_env: String,

    /// Deadline for a single remote call. When unset the engine imposes no
    /// deadline of its own and relies on the network layer.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl QuestionServiceConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON record per session
    pub path: PathBuf,
}

/// Per-difficulty answer budgets and the countdown tick period
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub easy_secs: u32,
    pub medium_secs: u32,
    pub hard_secs: u32,
    pub tick_millis: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        let budget = TimeBudget::default();
        Self {
            easy_secs: budget.easy_secs,
            medium_secs: budget.medium_secs,
            hard_secs: budget.hard_secs,
            tick_millis: 1000,
        }
    }
}

impl TimingConfig {
    pub fn budget(&self) -> TimeBudget {
        TimeBudget {
            easy_secs: self.easy_secs,
            medium_secs: self.medium_secs,
            hard_secs: self.hard_secs,
        }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }
}

impl Config {
    /// Load from a config file (extension optional) overlaid by
    /// `MOCK_INTERVIEW__SECTION__KEY` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("MOCK_INTERVIEW")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read config from {}", path))?;

        settings
            .try_deserialize()
            .context("Failed to deserialize config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_config_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "mock-interview"

[service.http]
bind = "127.0.0.1"
port = 8080

[question_service]
base_url = "https://api.groq.com/openai/v1"
model = "openai/gpt-oss-20b"
api_key_env = "GROQ_API_KEY"
request_timeout_secs = 15

[storage]
path = "data/sessions"

[timing]
hard_secs = 90
"#
        )
        .unwrap();

        let cfg = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.service.http.port, 8080);
        assert_eq!(cfg.question_service.request_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(cfg.timing.easy_secs, 20, "Unset budgets keep their defaults");
        assert_eq!(cfg.timing.hard_secs, 90);
        assert_eq!(cfg.timing.tick_period(), Duration::from_secs(1));
    }

    #[test]
    fn test_timing_defaults_match_budget() {
        let timing = TimingConfig::default();
        let budget = timing.budget();
        assert_eq!(budget, TimeBudget::default());
    }
}
