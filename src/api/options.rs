//! Choices offered to the client.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::AppState;
use crate::extract::{Capabilities, DocumentKind};
use crate::llm::ModelChoice;
use crate::prompt::MAX_DOCUMENT_CHARS;

#[derive(Debug, Serialize)]
pub struct ModelOption {
    pub id: ModelChoice,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct FormatOption {
    pub kind: DocumentKind,
    pub label: &'static str,
    pub mime_type: &'static str,
    /// Whether this build can extract the format.
    pub available: bool,
}

/// Response of `GET /api/options`.
#[derive(Debug, Serialize)]
pub struct OptionsResponse {
    pub models: Vec<ModelOption>,
    pub default_model: ModelChoice,
    pub default_temperature: f64,
    /// A server-side credential is configured, so clients may omit theirs.
    pub server_credential: bool,
    pub formats: Vec<FormatOption>,
    pub capabilities: Capabilities,
    pub max_document_chars: usize,
    pub max_upload_bytes: usize,
}

/// GET /api/options - Models, defaults and supported formats.
pub async fn get_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    let capabilities = state.extractor.capabilities();

    Json(OptionsResponse {
        models: ModelChoice::ALL
            .into_iter()
            .map(|id| ModelOption {
                id,
                description: id.description(),
            })
            .collect(),
        default_model: state.config.llm.default_model,
        default_temperature: state.config.llm.default_temperature,
        server_credential: state.config.llm.api_key().is_some(),
        formats: DocumentKind::ALL
            .into_iter()
            .map(|kind| FormatOption {
                kind,
                label: kind.label(),
                mime_type: kind.mime_type(),
                available: capabilities.supports(kind),
            })
            .collect(),
        capabilities,
        max_document_chars: MAX_DOCUMENT_CHARS,
        max_upload_bytes: state.config.server.max_upload_bytes,
    })
}
