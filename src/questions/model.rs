use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use super::messages::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::QuestionServiceConfig;

/// Failure talking to the remote model. Never leaves the question service;
/// every variant degrades to the fallback bank.
#[derive(Debug, thiserror::Error)]
pub enum QuestionServiceError {
    #[error("no API key configured (set {0})")]
    MissingApiKey(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("reply contained no message content")]
    EmptyReply,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("could not parse reply: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Language model that turns a prompt into raw reply text
#[async_trait]
pub trait QuestionModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, QuestionServiceError>;

    /// Model name for logging
    fn name(&self) -> &str;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionsModel {
    client: Client,
    base_url: String,
    model: String,
    api_key_env: String,
    api_key: Option<String>,
}

impl ChatCompletionsModel {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
            model: model.into(),
            api_key_env: String::new(),
            api_key,
        }
    }

    /// Build from config, reading the key from the configured environment variable
    pub fn from_config(config: &QuestionServiceConfig) -> Self {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty());

        if api_key.is_none() {
            warn!(
                "{} not set - every question will come from the fallback bank",
                config.api_key_env
            );
        } else {
            info!("Question model: {} at {}", config.model, config.base_url);
        }

        Self {
            api_key_env: config.api_key_env.clone(),
            ..Self::new(config.base_url.clone(), config.model.clone(), api_key)
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl QuestionModel for ChatCompletionsModel {
    async fn complete(&self, prompt: &str) -> Result<String, QuestionServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| QuestionServiceError::MissingApiKey(self.api_key_env.clone()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(QuestionServiceError::Status(response.status().as_u16()));
        }

        let reply: ChatResponse = response.json().await?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or(QuestionServiceError::EmptyReply)
    }

    fn name(&self) -> &str {
        &self.model
    }
}
