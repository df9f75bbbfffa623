//! Chat-completion client.
//!
//! This module provides a small, non-streaming abstraction over the `OpenAI`
//! Chat Completions API and compatible providers.
//!
//! # Overview
//!
//! The [`CompletionService`] trait is the seam between the insight pipeline
//! and the remote model. [`ChatCompletionsDriver`] is the HTTP
//! implementation; tests substitute their own.
//!
//! # Example
//!
//! ```rust,ignore
//! use doc_insights::llm::{
//!     ChatCompletionsDriver, CompletionRequest, DEFAULT_BASE_URL, LlmSettings, Message,
//! };
//!
//! let driver = ChatCompletionsDriver::new(LlmSettings::for_base_url(DEFAULT_BASE_URL));
//! let request = CompletionRequest {
//!     model: "gpt-3.5-turbo".to_string(),
//!     messages: vec![Message::user("Hello")],
//!     max_tokens: 1000,
//!     temperature: 0.3,
//! };
//! let text = driver.complete("sk-...", &request).await?;
//! ```

pub mod chat_completions;
pub mod provider;

pub use chat_completions::ChatCompletionsDriver;
pub use provider::Provider;

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// LLM connection settings.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    /// Base URL for the LLM API (e.g., `https://api.openai.com`).
    pub base_url: String,
    /// Provider type (auto-detected from `base_url`).
    pub provider: Provider,
    /// Whole-request timeout. `None` leaves the transport default in place.
    pub request_timeout: Option<Duration>,
}

impl LlmSettings {
    /// Settings for a base URL, detecting the provider from it.
    #[must_use]
    pub fn for_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let provider = Provider::detect_from_url(&base_url);
        Self {
            base_url,
            provider,
            request_timeout: None,
        }
    }
}

/// Models offered to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelChoice {
    /// Faster and cheaper.
    #[default]
    #[serde(rename = "gpt-3.5-turbo")]
    Gpt35Turbo,
    /// More accurate but slower.
    #[serde(rename = "gpt-4")]
    Gpt4,
    /// More accurate, larger context.
    #[serde(rename = "gpt-4-turbo")]
    Gpt4Turbo,
}

impl ModelChoice {
    /// All offered models, fastest first.
    pub const ALL: [Self; 3] = [Self::Gpt35Turbo, Self::Gpt4, Self::Gpt4Turbo];

    /// Model identifier sent to the API.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Gpt35Turbo => "gpt-3.5-turbo",
            Self::Gpt4 => "gpt-4",
            Self::Gpt4Turbo => "gpt-4-turbo",
        }
    }

    /// One-line description for the model picker.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Gpt35Turbo => "Faster and cheaper",
            Self::Gpt4 => "More accurate but slower",
            Self::Gpt4Turbo => "More accurate, larger context window",
        }
    }
}

impl std::fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for ModelChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.id() == s.trim())
            .ok_or_else(|| {
                let offered: Vec<&str> = Self::ALL.iter().map(|m| m.id()).collect();
                format!("unknown model '{s}', expected one of: {}", offered.join(", "))
            })
    }
}

/// Role of a message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System prompt.
    System,
    /// User message.
    User,
}

/// A message in a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message author.
    pub role: MessageRole,
    /// Text content.
    pub content: String,
}

impl Message {
    /// Create a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A single non-streaming completion request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Cap on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Errors returned by a [`CompletionService`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error detail reported by the service (or the raw body).
        message: String,
    },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("{0}")]
    Transport(String),

    /// The response did not have the expected shape.
    #[error("Unexpected response from the model service: {0}")]
    InvalidResponse(String),
}

/// A remote chat-completion service.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync {
    /// Send one request and return the first choice's message content.
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError>;
}
