// src/services/completion.rs

//! Chat-completion client for the hosted language model.
//!
//! Calls are logged with latency, status and response size. The API key and
//! message contents are never logged.

use std::{sync::Arc, time::{Duration, Instant}};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use crate::{
    config::{Config, OpenAiConfig},
    error::AppError,
};

pub const DEFAULT_MAX_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One message in a chat-completion request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Text generation capability: given chat turns, returns the model's reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, turns: &[ChatTurn], max_tokens: u32) -> Result<String, AppError>;
}

/// Builds the client described by the configuration, or a disabled one.
pub fn from_config(config: &Config) -> Arc<dyn CompletionClient> {
    match config.openai.clone().map(AzureOpenAi::new) {
        Some(Ok(client)) => Arc::new(client),
        Some(Err(e)) => {
            tracing::error!("Language model disabled, invalid configuration: {}", e);
            Arc::new(DisabledCompletion)
        }
        None => {
            tracing::warn!("AZURE_OPENAI_* not set, language model features are disabled");
            Arc::new(DisabledCompletion)
        }
    }
}

/// Azure OpenAI chat-completions deployment.
#[derive(Clone)]
pub struct AzureOpenAi {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    deployment: String,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatTurn],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl AzureOpenAi {
    pub fn new(config: OpenAiConfig) -> Result<Self, AppError> {
        let mut url = Url::parse(&format!(
            "{}/openai/deployments/{}/chat/completions",
            config.endpoint, config.deployment
        ))
        .map_err(|e| AppError::InternalServerError(format!("Invalid AZURE_OPENAI_ENDPOINT: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("api-version", &config.api_version);

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(Self {
            client,
            url,
            api_key: config.api_key,
            deployment: config.deployment,
        })
    }
}

#[async_trait]
impl CompletionClient for AzureOpenAi {
    #[instrument(level = "info", skip(self, turns), fields(deployment = %self.deployment))]
    async fn complete(&self, turns: &[ChatTurn], max_tokens: u32) -> Result<String, AppError> {
        let started = Instant::now();
        let body = CompletionRequest {
            messages: turns,
            max_tokens,
            temperature: TEMPERATURE,
        };

        let res = self
            .client
            .post(self.url.clone())
            .header(USER_AGENT, concat!("grammar-tutor/", env!("CARGO_PKG_VERSION")))
            .header(CONTENT_TYPE, "application/json")
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Language model request failed: {}", e)))?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%status, latency_ms = started.elapsed().as_millis() as u64, "Language model returned an error");
            return Err(AppError::UpstreamUnavailable(format!(
                "Language model returned HTTP {}",
                status
            )));
        }

        let parsed: CompletionResponse = res
            .json()
            .await
            .map_err(|e| AppError::UpstreamUnavailable(format!("Malformed completion response: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            response_chars = text.chars().count(),
            "Language model call completed"
        );

        if text.is_empty() {
            return Err(AppError::UpstreamUnavailable(
                "Language model returned empty content".to_string(),
            ));
        }

        Ok(text)
    }
}

/// Stand-in used when no model is configured. Every call fails as retryable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCompletion;

#[async_trait]
impl CompletionClient for DisabledCompletion {
    async fn complete(&self, _turns: &[ChatTurn], _max_tokens: u32) -> Result<String, AppError> {
        Err(AppError::UpstreamUnavailable(
            "Language model is not configured".to_string(),
        ))
    }
}
