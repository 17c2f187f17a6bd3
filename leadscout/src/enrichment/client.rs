//! Text-generation client used for enrichment.
//!
//! `GroqChatClient` speaks the OpenAI-compatible chat-completions protocol.
//! The credential is passed in at construction; the client never reads the
//! process environment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::EnrichmentError;

/// Default model for enrichment requests.
pub const DEFAULT_MODEL: &str = "gemma2-9b-it";

/// Default OpenAI-compatible endpoint base.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Protocol for a single-prompt text completion.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends one user prompt and returns the completion text.
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError>;

    /// The model name used for requests.
    fn model(&self) -> &str;
}

/// A chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    /// Model to use.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Chat-completions response body (only the parts we read).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    /// Completion choices.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatMessage,
}

impl ChatResponse {
    /// Content of the first choice.
    pub fn into_content(self) -> Result<String, EnrichmentError> {
        self.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(EnrichmentError::EmptyResponse)
    }
}

/// Chat-completions client for Groq and other OpenAI-compatible endpoints.
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct GroqChatClient {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[cfg(feature = "http")]
impl std::fmt::Debug for GroqChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqChatClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "http")]
impl GroqChatClient {
    /// Creates a client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self, EnrichmentError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EnrichmentError::Config("API key is empty".to_string()));
        }

        Ok(Self {
            http_client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Sets the model.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets a custom base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request_for(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: None,
        }
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl ChatClient for GroqChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, EnrichmentError> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_for(prompt))
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Enrichment request failed");
                EnrichmentError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, error = %message, "Enrichment API error");
            return Err(EnrichmentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Parse(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Chat completion"
        );

        body.into_content()
    }

    fn model(&self) -> &str {
        &self.model
    }
}
