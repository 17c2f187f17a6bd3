//! Record enrichment through an external text-generation endpoint.
//!
//! This module provides:
//! - The `ChatClient` protocol and an OpenAI-compatible implementation
//! - Retry policy with flat or growing delays
//! - Prompt construction
//! - The per-record retrier with its sentinel fallback

mod client;
mod prompt;
mod retrier;
mod retry;

#[cfg(feature = "http")]
pub use client::GroqChatClient;
#[cfg(test)]
pub use client::MockChatClient;
pub use client::{
    ChatChoice, ChatClient, ChatMessage, ChatRequest, ChatResponse, DEFAULT_BASE_URL,
    DEFAULT_MODEL,
};
pub use prompt::{build_prompt, first_line, PROMPT_PREAMBLE};
pub use retrier::{EnrichmentReport, EnrichmentRetrier, FAILURE_SENTINEL};
pub use retry::{retry_async, BackoffStrategy, RetryOutcome, RetryPolicy};
