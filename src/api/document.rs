//! Document upload and extraction.

use axum::{
    Json,
    extract::{
        Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};

use super::{ApiError, find_session};
use crate::AppState;
use crate::extract::UploadedFile;
use crate::session::{DocumentSummary, LoadedDocument};

/// Multipart field carrying the document.
const FILE_FIELD: &str = "file";

/// Name used when the client sends none.
const FALLBACK_FILENAME: &str = "document";

/// POST /api/sessions/{id}/document - Upload a file and extract its text.
///
/// Accepts multipart form data with a single `file` field. A successful
/// extraction replaces the session's document and clears its last insight;
/// a failed one leaves the session without a document.
pub async fn upload_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DocumentSummary>, ApiError> {
    let session = find_session(&state, &id)?;
    let mut multipart = multipart?;
    let limit = state.config.server.max_upload_bytes;
    let file = read_file_field(&mut multipart, limit).await?;

    tracing::info!(
        session_id = %id,
        filename = %file.filename,
        content_type = ?file.content_type,
        size = file.size(),
        "Document uploaded"
    );

    let _action = session.begin_action().await;

    let extractor = state.extractor;
    let filename = file.filename.clone();
    let size_bytes = file.size();
    let result = tokio::task::spawn_blocking(move || extractor.extract(&file))
        .await
        .map_err(|e| ApiError::Internal(format!("extraction task failed: {e}")))?;

    let extracted = match result {
        Ok(extracted) => extracted,
        Err(e) => {
            session.reset();
            return Err(e.into());
        }
    };

    let document = LoadedDocument {
        filename,
        kind: extracted.kind,
        size_bytes,
        text: extracted.text,
    };
    let summary = DocumentSummary::from(&document);
    session.set_document(document);

    tracing::info!(
        session_id = %id,
        filename = %summary.filename,
        kind = %summary.kind,
        chars = summary.char_count,
        "Document ready for questions"
    );

    Ok(Json(summary))
}

/// Pull the `file` field out of a multipart body, skipping any others.
async fn read_file_field(multipart: &mut Multipart, limit: usize) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_error(&e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(FALLBACK_FILENAME)
            .to_string();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| upload_error(&e, limit))?;

        return Ok(UploadedFile::new(filename, content_type, bytes.to_vec()));
    }

    Err(ApiError::MissingFile)
}

fn upload_error(err: &MultipartError, limit: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::UploadTooLarge(limit)
    } else {
        ApiError::Upload(err.body_text())
    }
}
