//! HTTP API handlers.
//!
//! Routes are assembled in [`crate::server::router`].

pub mod document;
pub mod error;
pub mod insights;
pub mod options;
pub mod sessions;

pub use error::{ApiError, ErrorBody};

use crate::AppState;
use crate::session::Session;

/// Look up a session or fail with 404.
pub(crate) fn find_session(state: &AppState, id: &str) -> Result<Session, ApiError> {
    state
        .sessions
        .get(id)
        .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
}
