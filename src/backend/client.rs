//! Client for OpenAI-compatible chat-completion endpoints.
//!
//! One call sends a single user message to one model and returns the
//! first completion's text, or a classified [`BackendError`].

use crate::error::BackendError;
use crate::models::ModelId;
use anyhow::{Context, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// OpenRouter's chat-completion endpoint.
pub const DEFAULT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Configuration for the client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_url: String,
    /// Bearer credential shared by every panel member.
    pub api_key: Option<String>,
    /// Ceiling for one call, connect through body.
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout_seconds: 30,
        }
    }
}

/// Message in a chat request.
#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat-completion request body.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

/// Response body: either an upstream error or a list of choices.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionEnvelope {
    Error { error: UpstreamError },
    Success { choices: Vec<Choice> },
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP client for chat-completion backends.
pub struct ChatClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ChatClient {
    /// Create a client with a bounded per-call timeout.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Whether a non-blank credential is configured.
    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    fn credential(&self) -> Option<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
    }

    /// Send `prompt` to `model` and return the completion text.
    ///
    /// Makes at most one request; never retries.
    pub async fn complete(&self, model: &ModelId, prompt: &str) -> Result<String, BackendError> {
        let api_key = self.credential().ok_or(BackendError::MissingCredential)?;

        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Querying {} at {}", model, self.config.api_url);

        let response = self
            .http_client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!("{} responded with {}", model, status);

        if status != StatusCode::OK {
            return Err(BackendError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await?;
        extract_content(&body)
    }
}

/// Decode a response body into the first completion's text.
fn extract_content(body: &str) -> Result<String, BackendError> {
    let envelope: CompletionEnvelope =
        serde_json::from_str(body).map_err(|_| BackendError::MalformedResponse)?;

    match envelope {
        CompletionEnvelope::Error { error } => Err(BackendError::Upstream(error.message)),
        CompletionEnvelope::Success { choices } => choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(BackendError::MalformedResponse),
    }
}
