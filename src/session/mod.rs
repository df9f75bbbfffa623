//! Per-user document sessions.
//!
//! This module provides in-memory session storage for the upload → extract →
//! ask → export flow. Sessions are identified by UUID and hold the current
//! document and the last generated insight. Nothing is persisted.
//!
//! # Architecture
//!
//! - [`Session`]: one user's document, last insight and action lock
//! - [`SessionStore`]: thread-safe store for all active sessions
//!
//! # Example
//!
//! ```rust
//! use doc_insights::extract::DocumentKind;
//! use doc_insights::session::{LoadedDocument, SessionStore};
//!
//! let store = SessionStore::new();
//! let session = store.create();
//! session.set_document(LoadedDocument {
//!     filename: "notes.txt".to_string(),
//!     kind: DocumentKind::PlainText,
//!     size_bytes: 5,
//!     text: "hello".to_string(),
//! });
//!
//! assert_eq!(session.snapshot().document.unwrap().filename, "notes.txt");
//! session.reset();
//! assert!(session.snapshot().document.is_none());
//! ```

mod store;

pub use store::{
    DEFAULT_SESSION_TIMEOUT, DocumentSummary, LoadedDocument, Session, SessionSnapshot,
    SessionState, SessionStore,
};
