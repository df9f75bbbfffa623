//! Insight generation.
//!
//! Validates a generate action, assembles the prompt, sends it to the
//! completion service and maps every failure onto [`InsightError`]. Each
//! failure is terminal for that call: nothing is retried.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::llm::{CompletionError, CompletionRequest, CompletionService, Message, ModelChoice};
use crate::prompt::{SYSTEM_PROMPT, build_prompt};

/// Cap on generated tokens for every call.
pub const MAX_OUTPUT_TOKENS: u32 = 1000;

/// Default sampling temperature ("creativity level").
pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Everything needed for one generate action.
#[derive(Debug, Clone)]
pub struct InsightRequest {
    /// Extracted document text.
    pub document_text: String,
    /// The user's question, verbatim.
    pub question: String,
    /// Model to ask.
    pub model: ModelChoice,
    /// Sampling temperature in `[0.0, 1.0]`.
    pub temperature: f64,
}

/// A generated answer, kept in the session for display and export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightRecord {
    /// Question that was asked.
    pub question: String,
    /// Generated answer text.
    pub insight: String,
    /// Model that answered.
    pub model: ModelChoice,
    /// Temperature used.
    pub temperature: f64,
    /// When the answer was received.
    pub generated_at: DateTime<Local>,
}

/// Why a generate action produced no insight.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InsightError {
    /// No credential was supplied or configured.
    #[error("Please enter your OpenAI API key.")]
    MissingCredential,

    /// The question was empty.
    #[error("Please enter a question.")]
    MissingQuestion,

    /// No extracted text to ask about.
    #[error("Please upload a document and extract its text first.")]
    MissingDocument,

    /// Temperature outside `[0.0, 1.0]`.
    #[error("Creativity level must be between 0.0 and 1.0, got {0}.")]
    InvalidTemperature(f64),

    /// The service rejected the credential.
    #[error("Invalid API key. Please check your OpenAI API key and try again.")]
    Authentication,

    /// Rate limit or quota exceeded.
    #[error("Rate limit exceeded. Please check your API quota or try again later.")]
    RateLimited,

    /// The service rejected the request itself (unknown model, prompt too long).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Any other failure: network, timeout, server error, unexpected body.
    #[error("Error generating insights: {0}")]
    Other(String),
}

impl InsightError {
    /// Stable machine-readable code for API responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::MissingQuestion => "missing_question",
            Self::MissingDocument => "missing_document",
            Self::InvalidTemperature(_) => "invalid_temperature",
            Self::Authentication => "authentication_failed",
            Self::RateLimited => "rate_limited",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Other(_) => "generation_failed",
        }
    }
}

impl From<CompletionError> for InsightError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::Status { status: 401, .. } => Self::Authentication,
            CompletionError::Status { status: 429, .. } => Self::RateLimited,
            CompletionError::Status {
                status: 400 | 404 | 413 | 422,
                message,
            } => Self::InvalidRequest(message),
            CompletionError::Transport(message) => Self::Other(message),
            other @ (CompletionError::Status { .. } | CompletionError::InvalidResponse(_)) => {
                Self::Other(other.to_string())
            }
        }
    }
}

/// Sends insight requests to a completion service.
#[derive(Clone)]
pub struct InsightRequester {
    service: Arc<dyn CompletionService>,
}

impl std::fmt::Debug for InsightRequester {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightRequester").finish_non_exhaustive()
    }
}

impl InsightRequester {
    /// Create a requester backed by `service`.
    #[must_use]
    pub fn new(service: Arc<dyn CompletionService>) -> Self {
        Self { service }
    }

    /// Validate, build the prompt, and ask the model.
    ///
    /// Validation failures return before any call is made.
    pub async fn request(
        &self,
        api_key: Option<&str>,
        request: InsightRequest,
    ) -> Result<InsightRecord, InsightError> {
        if request.document_text.trim().is_empty() {
            return Err(InsightError::MissingDocument);
        }
        let api_key = api_key
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(InsightError::MissingCredential)?;
        if request.question.trim().is_empty() {
            return Err(InsightError::MissingQuestion);
        }
        if !(0.0..=1.0).contains(&request.temperature) {
            return Err(InsightError::InvalidTemperature(request.temperature));
        }

        let prompt = build_prompt(&request.document_text, &request.question);
        let completion = CompletionRequest {
            model: request.model.id().to_string(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
            max_tokens: MAX_OUTPUT_TOKENS,
            temperature: request.temperature,
        };

        tracing::info!(
            model = %request.model,
            temperature = request.temperature,
            prompt_chars = completion.messages[1].content.chars().count(),
            "Requesting insights"
        );

        match self.service.complete(api_key, &completion).await {
            Ok(insight) => {
                tracing::info!(
                    model = %request.model,
                    insight_chars = insight.chars().count(),
                    "Insights generated"
                );
                Ok(InsightRecord {
                    question: request.question,
                    insight,
                    model: request.model,
                    temperature: request.temperature,
                    generated_at: Local::now(),
                })
            }
            Err(e) => {
                let err = InsightError::from(e);
                tracing::error!(model = %request.model, code = err.code(), error = %err, "Insight generation failed");
                Err(err)
            }
        }
    }
}
