//! Session lifecycle handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiError, find_session};
use crate::AppState;
use crate::session::SessionSnapshot;

/// POST /api/sessions - Start a new session.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.create();
    tracing::info!(session_id = %session.id(), "Session created");
    (StatusCode::CREATED, Json(session.snapshot()))
}

/// GET /api/sessions/{id} - Current document and last insight.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id)?;
    Ok(Json(session.snapshot()))
}

/// DELETE /api/sessions/{id} - Drop a session and everything in it.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(&id)
        .ok_or_else(|| ApiError::SessionNotFound(id.clone()))?;
    tracing::info!(session_id = %id, "Session deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/sessions/{id}/reset - Clear document, text and insight.
///
/// Waits for any in-flight action on the session to finish first.
pub async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let session = find_session(&state, &id)?;
    let _action = session.begin_action().await;
    session.reset();
    tracing::info!(session_id = %id, "Session reset");
    Ok(Json(session.snapshot()))
}
