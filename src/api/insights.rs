//! Insight generation and report download.

use std::fmt::Write;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, header},
    response::IntoResponse,
};
use chrono::Local;
use serde::Deserialize;

use super::{ApiError, find_session};
use crate::AppState;
use crate::export::{self, ExportFormat, ReportInput};
use crate::insights::{InsightError, InsightRecord, InsightRequest};
use crate::llm::ModelChoice;

/// Request body for a generate action.
#[derive(Deserialize)]
pub struct GenerateRequest {
    /// Question about the current document.
    #[serde(default)]
    pub question: String,
    /// Credential for this call; falls back to the configured one.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Model override, one of the offered model ids.
    #[serde(default)]
    pub model: Option<String>,
    /// Temperature override.
    #[serde(default)]
    pub temperature: Option<f64>,
}

impl std::fmt::Debug for GenerateRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateRequest")
            .field("question", &self.question)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// POST /api/sessions/{id}/insights - Ask a question about the document.
///
/// Only one generate action runs per session at a time. A failure leaves the
/// previous insight in place.
pub async fn generate_insights(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<InsightRecord>, ApiError> {
    let session = find_session(&state, &id)?;
    let Json(req) = payload?;
    let model = match req.model.as_deref().map(str::trim) {
        None | Some("") => state.config.llm.default_model,
        Some(id) => id.parse::<ModelChoice>().map_err(InsightError::InvalidRequest)?,
    };

    let _action = session.begin_action().await;

    let document_text = session
        .state()
        .document
        .map(|doc| doc.text)
        .unwrap_or_default();

    let api_key = req
        .api_key
        .filter(|key| !key.trim().is_empty())
        .or_else(|| state.config.llm.api_key().map(ToString::to_string));

    let request = InsightRequest {
        document_text,
        question: req.question,
        model,
        temperature: req
            .temperature
            .unwrap_or(state.config.llm.default_temperature),
    };

    tracing::debug!(
        session_id = %id,
        model = %request.model,
        temperature = request.temperature,
        "Generate requested"
    );

    let record = state.requester.request(api_key.as_deref(), request).await?;
    session.set_insight(record.clone());

    tracing::info!(session_id = %id, model = %record.model, "Insight stored");
    Ok(Json(record))
}

/// Query string for the export route.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// `txt` (default) or `md`.
    #[serde(default)]
    pub format: ExportFormat,
}

/// GET /api/sessions/{id}/export?format=txt|md - Download the last insight.
pub async fn export_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<ExportQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let session = find_session(&state, &id)?;
    let Query(query) = query?;
    let current = session.state();
    let (Some(document), Some(insight)) = (current.document, current.last_insight) else {
        return Err(ApiError::NothingToExport);
    };

    let report = export::render(
        query.format,
        &ReportInput {
            filename: &document.filename,
            question: &insight.question,
            insight: &insight.insight,
            document_text: &document.text,
            generated_at: Local::now(),
        },
    );

    let disposition = HeaderValue::from_str(&content_disposition(&report.file_name))
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    tracing::info!(
        session_id = %id,
        file_name = %report.file_name,
        bytes = report.body.len(),
        "Report exported"
    );

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(report.content_type)),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        report.body,
    ))
}

/// `attachment` disposition with an ASCII fallback name and the exact name
/// percent-encoded in `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let mut encoded = String::with_capacity(file_name.len());
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            let _ = write!(encoded, "%{byte:02X}");
        }
    }

    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
