//! Transport to the external text-generation service
//!
//! `CompletionClient` is the seam between the FAQ pipeline and the service.
//! `OpenAiClient` speaks the chat-completions protocol over reqwest; tests
//! substitute their own implementations.

use crate::config::GenerationConfig;
use crate::ConfigError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Distinct failure kinds of a generation call
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid API key for the generation service")]
    Auth,

    #[error("Generation service rate limit exceeded, try again later")]
    RateLimited,

    #[error("Generation service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Failed to generate FAQs: {0}")]
    Other(String),
}

/// A service that turns a system and user message into a completion
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Sends one request and returns the raw text of the first completion
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Chat-completions client for OpenAI-compatible endpoints
#[derive(Clone)]
pub struct OpenAiClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiClient {
    /// Creates a client with an explicit API key
    ///
    /// Every request is bounded by the configured request timeout.
    pub fn new(api_key: impl Into<String>, config: &GenerationConfig) -> reqwest::Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Creates a client reading the API key from the configured environment variable
    pub fn from_env(config: &GenerationConfig) -> crate::Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| ConfigError::MissingEnv(config.api_key_env.clone()))?;
        Ok(Self::new(api_key, config)?)
    }

    /// Overrides the base URL (proxies, compatible services, test servers)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, GenerationError> {
        let start = std::time::Instant::now();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, timeout = e.is_timeout(), "Generation request failed");
                GenerationError::Other(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %body, "Generation service error");
            return Err(classify_status(status, body));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("invalid response body: {}", e)))?;

        let content = raw
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::Other("no completion returned".to_string()))?
            .message
            .content
            .unwrap_or_default();

        tracing::debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion"
        );

        Ok(content)
    }
}

fn classify_status(status: StatusCode, body: String) -> GenerationError {
    match status {
        StatusCode::UNAUTHORIZED => GenerationError::Auth,
        StatusCode::TOO_MANY_REQUESTS => GenerationError::RateLimited,
        s if s.is_server_error() => GenerationError::Service {
            status: s.as_u16(),
            message: body,
        },
        s => GenerationError::Other(format!("HTTP {}: {}", s.as_u16(), body)),
    }
}
