//! JSON error responses.

use axum::{
    Json,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::extract::ExtractionError;
use crate::insights::InsightError;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// User-facing message.
    pub error: String,
    /// Machine-readable kind.
    pub code: &'static str,
}

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session '{0}' not found")]
    SessionNotFound(String),

    #[error("Please choose a file to upload.")]
    MissingFile,

    #[error("Failed to read upload: {0}")]
    Upload(String),

    #[error("File is too large. Uploads are limited to {} MB.", .0.div_ceil(1024 * 1024))]
    UploadTooLarge(usize),

    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartRejection),

    #[error("Invalid request body: {0}")]
    Body(#[from] JsonRejection),

    #[error("Invalid query: {0}")]
    Query(#[from] QueryRejection),

    #[error("Generate insights before downloading a report.")]
    NothingToExport,

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Insight(#[from] InsightError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SessionNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingFile | Self::Upload(_) | Self::NothingToExport => StatusCode::BAD_REQUEST,
            Self::UploadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Multipart(e) => e.status(),
            Self::Body(e) => e.status(),
            Self::Query(e) => e.status(),
            Self::Extraction(e) => match e {
                ExtractionError::UnsupportedFormat(_)
                | ExtractionError::CapabilityUnavailable { .. } => {
                    StatusCode::UNSUPPORTED_MEDIA_TYPE
                }
                ExtractionError::ExtractionFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Insight(e) => match e {
                InsightError::MissingCredential
                | InsightError::MissingQuestion
                | InsightError::MissingDocument
                | InsightError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
                InsightError::InvalidTemperature(_) => StatusCode::UNPROCESSABLE_ENTITY,
                InsightError::Authentication => StatusCode::UNAUTHORIZED,
                InsightError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                InsightError::Other(_) => StatusCode::BAD_GATEWAY,
            },
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable kind.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::MissingFile => "missing_file",
            Self::Upload(_) | Self::Multipart(_) => "invalid_upload",
            Self::UploadTooLarge(_) => "upload_too_large",
            Self::Body(_) => "invalid_body",
            Self::Query(_) => "invalid_query",
            Self::NothingToExport => "nothing_to_export",
            Self::Extraction(e) => e.code(),
            Self::Insight(e) => e.code(),
            Self::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            code: self.code(),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = body.code, error = %body.error, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), code = body.code, error = %body.error, "Request rejected");
        }

        (status, Json(body)).into_response()
    }
}
