// Language-model gateway client.
//
// Talks to an OpenAI-compatible chat-completions endpoint. The classifier
// only needs `complete(system, user) -> text`, which is what the
// LanguageModel trait exposes; the help assistant additionally uses
// `chat()` with a full conversation history.
//
// Upstream failures are typed so callers can tell a rate limit (429) and
// an exhausted quota (402) apart from everything else.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Default chat-completions endpoint.
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Default model for classification.
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";

/// Failures from the upstream model endpoint.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("rate limit exceeded")]
    RateLimited,
    #[error("AI credits exhausted")]
    QuotaExhausted,
    #[error("request to the model gateway timed out")]
    Timeout,
    #[error("model gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("model gateway request failed: {0}")]
    Transport(String),
    #[error("unexpected model gateway response: {0}")]
    MalformedResponse(String),
}

impl LlmError {
    /// Failures a synchronous caller should show to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, LlmError::RateLimited | LlmError::QuotaExhausted)
    }

    /// Map a non-success HTTP status to an error kind.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimited,
            StatusCode::PAYMENT_REQUIRED => LlmError::QuotaExhausted,
            _ => LlmError::Status {
                status: status.as_u16(),
                body,
            },
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Transport(err.to_string())
        }
    }
}

/// A text-completion capability: system instruction plus one user turn in,
/// generated text out.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}

/// A multi-turn chat capability, used by the help assistant.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a full conversation and return the reply text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

/// One turn of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
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

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// HTTP client for the model gateway.
pub struct GatewayClient {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl GatewayClient {
    /// Create a client. `timeout` caps every request so a hung upstream
    /// can't hold a background task forever.
    pub fn new(url: &str, api_key: &str, model: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent("sahayak/0.1 (distress-verification)")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    /// Same gateway and credentials, different model.
    pub fn with_model(&self, model: &str) -> Self {
        Self {
            client: self.client.clone(),
            url: self.url.clone(),
            api_key: self.api_key.clone(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl ChatModel for GatewayClient {
    /// Send a full conversation and return the first choice's text.
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
        };

        debug!(model = %self.model, turns = messages.len(), "Calling model gateway");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "Model gateway error");
            return Err(LlmError::from_status(status, body));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        extract_content(body)
    }
}

#[async_trait]
impl LanguageModel for GatewayClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        self.chat(&[ChatMessage::system(system_prompt), ChatMessage::user(user_prompt)])
            .await
    }
}

fn extract_content(body: CompletionResponse) -> Result<String, LlmError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| LlmError::MalformedResponse("response has no message content".to_string()))
}

// --- Chat-completions request/response types ---

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
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
