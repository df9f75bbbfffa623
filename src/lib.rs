//! Document Insights
//!
//! Upload a PDF, DOCX or plain-text document, ask a question about it, and
//! get an answer generated by an `OpenAI` chat model, grounded only in the
//! document's text. Answers can be downloaded as text or markdown reports.
//!
//! # Architecture
//!
//! - **Extraction**: bytes + type hint → plain text, with optional parsers
//!   behind the `pdf` and `docx` features
//! - **Prompt**: fixed instruction template with a 12,000-character document
//!   budget
//! - **Insights**: validation, one non-streaming completion call, typed errors
//! - **Sessions**: in-memory per-user state with an atomic reset
//! - **Server**: Axum JSON API and a single HTML page
//!
//! # Modules
//!
//! - [`extract`]: document type detection and text extraction
//! - [`prompt`]: prompt assembly and truncation
//! - [`llm`]: completion service trait and HTTP driver
//! - [`insights`]: insight requests and error mapping
//! - [`export`]: downloadable reports
//! - [`session`]: session state and storage
//! - [`api`]: HTTP handlers
//! - [`config`]: layered configuration

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod api;
pub mod config;
pub mod export;
pub mod extract;
pub mod insights;
pub mod llm;
pub mod prompt;
pub mod server;
pub mod session;
pub mod telemetry;
pub mod ui;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::extract::{Capabilities, Extractor};
use crate::insights::InsightRequester;
use crate::llm::CompletionService;
use crate::session::SessionStore;

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Global configuration.
    pub config: Arc<AppConfig>,
    /// Per-user sessions.
    pub sessions: SessionStore,
    /// Text extractor limited to the compiled-in parsers.
    pub extractor: Extractor,
    /// Sends questions to the model.
    pub requester: InsightRequester,
}

impl AppState {
    /// Build the state around a completion service.
    #[must_use]
    pub fn new(config: Arc<AppConfig>, service: Arc<dyn CompletionService>) -> Self {
        let sessions = SessionStore::with_timeout(config.session.idle_timeout());
        Self {
            config,
            sessions,
            extractor: Extractor::new(Capabilities::detect()),
            requester: InsightRequester::new(service),
        }
    }
}
