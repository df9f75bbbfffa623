//! `OpenAI` Chat Completions API driver.
//!
//! Implements [`CompletionService`] against `/v1/chat/completions` (or the
//! provider's equivalent) with a single non-streaming request.

use serde::Deserialize;

use super::{CompletionError, CompletionRequest, CompletionService, LlmSettings};

/// Driver for the `OpenAI` Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Response body of a successful completion.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Error envelope used by `OpenAI`-compatible services.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

impl ChatCompletionsDriver {
    /// Create a new Chat Completions driver with the given settings.
    ///
    /// Falls back to a default client if the configured timeout cannot be
    /// applied.
    #[must_use]
    pub fn new(settings: LlmSettings) -> Self {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to build configured HTTP client, using defaults");
            reqwest::Client::new()
        });

        Self { http, settings }
    }

    /// Settings this driver was created with.
    #[must_use]
    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }
}

#[async_trait::async_trait]
impl CompletionService for ChatCompletionsDriver {
    async fn complete(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let url = self
            .settings
            .provider
            .build_chat_url(&self.settings.base_url, &request.model);

        tracing::debug!(
            url = %url,
            model = %request.model,
            message_count = request.messages.len(),
            max_tokens = request.max_tokens,
            temperature = request.temperature,
            "Sending chat completion request"
        );

        let mut rb = self.http.post(&url).json(request);
        rb = if self.settings.provider.uses_api_key_header() {
            rb.header("api-key", api_key)
        } else {
            rb.bearer_auth(api_key)
        };

        let resp = rb
            .send()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = error_detail(&body)
                .or_else(|| status.canonical_reason().map(ToString::to_string))
                .unwrap_or_else(|| "no detail provided".to_string());
            tracing::warn!(status = status.as_u16(), error = %message, "Chat completion rejected");
            return Err(CompletionError::Status {
                status: status.as_u16(),
                message,
            });
        }

        parse_content(&body)
    }
}

/// Pull `error.message` out of an error body, or use the trimmed body.
fn error_detail(body: &str) -> Option<String> {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return Some(envelope.error.message);
    }
    let trimmed = body.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Extract the first choice's message content from a success body.
fn parse_content(body: &str) -> Result<String, CompletionError> {
    let parsed: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| CompletionError::InvalidResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| CompletionError::InvalidResponse("response contained no message content".to_string()))
}
