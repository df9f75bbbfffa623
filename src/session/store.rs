//! Session state and session storage.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::extract::{DocumentKind, PREVIEW_CHARS, preview};
use crate::insights::InsightRecord;

/// Default idle timeout (30 minutes).
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// A document whose text has been extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDocument {
    /// Original upload name.
    pub filename: String,
    /// Format the text came from.
    pub kind: DocumentKind,
    /// Size of the uploaded file.
    pub size_bytes: usize,
    /// Extracted text.
    pub text: String,
}

/// Everything a session remembers between actions.
///
/// Filename and text travel together in [`LoadedDocument`], so a session
/// never holds one without the other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Current document, if one was extracted.
    pub document: Option<LoadedDocument>,
    /// Last successful insight for the current document.
    pub last_insight: Option<InsightRecord>,
}

/// Display summary of a loaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    /// Original upload name.
    pub filename: String,
    /// Format the text came from.
    pub kind: DocumentKind,
    /// Upload size in KiB.
    pub size_kb: f64,
    /// Characters of extracted text.
    pub char_count: usize,
    /// Leading characters of the text.
    pub preview: String,
}

impl From<&LoadedDocument> for DocumentSummary {
    #[allow(clippy::cast_precision_loss)]
    fn from(doc: &LoadedDocument) -> Self {
        Self {
            filename: doc.filename.clone(),
            kind: doc.kind,
            size_kb: doc.size_bytes as f64 / 1024.0,
            char_count: doc.text.chars().count(),
            preview: preview(&doc.text, PREVIEW_CHARS),
        }
    }
}

/// Serializable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    /// Session identifier.
    pub id: String,
    /// Current document, if any.
    pub document: Option<DocumentSummary>,
    /// Last insight, if any.
    pub last_insight: Option<InsightRecord>,
    /// Last activity time.
    pub last_activity: DateTime<Utc>,
}

/// A single user session.
///
/// Cloning is cheap; clones share state.
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    /// Unique session identifier.
    id: String,
    state: RwLock<SessionState>,
    /// Serializes extract, generate and reset for this session.
    action: Mutex<()>,
    last_activity: RwLock<DateTime<Utc>>,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Utc::now();
        Self {
            inner: Arc::new(SessionInner {
                id,
                state: RwLock::new(SessionState::default()),
                action: Mutex::new(()),
                last_activity: RwLock::new(now),
            }),
        }
    }

    /// Get the session ID.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Wait for exclusive use of the session.
    ///
    /// Hold the guard for the whole action so at most one extraction or
    /// completion request runs per session.
    pub async fn begin_action(&self) -> MutexGuard<'_, ()> {
        self.inner.action.lock().await
    }

    /// Replace the current document. Clears the previous insight.
    pub fn set_document(&self, document: LoadedDocument) {
        self.write(|state| {
            state.document = Some(document);
            state.last_insight = None;
        });
    }

    /// Store a freshly generated insight.
    pub fn set_insight(&self, record: InsightRecord) {
        self.write(|state| state.last_insight = Some(record));
    }

    /// Copy of the current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Serializable view of the current state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            id: self.inner.id.clone(),
            document: state.document.as_ref().map(DocumentSummary::from),
            last_insight: state.last_insight,
            last_activity: self.last_activity(),
        }
    }

    /// Clear document, text and insight in one step.
    pub fn reset(&self) {
        self.write(|state| *state = SessionState::default());
    }

    /// Time of the last state change.
    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        *self
            .inner
            .last_activity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if the session has been idle longer than `timeout`.
    #[must_use]
    pub fn is_expired_with_timeout(&self, timeout: Duration) -> bool {
        // A negative difference means clock skew; treat as fresh.
        (Utc::now() - self.last_activity())
            .to_std()
            .is_ok_and(|idle| idle > timeout)
    }

    fn write(&self, update: impl FnOnce(&mut SessionState)) {
        {
            let mut guard = self
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            update(&mut guard);
        }
        self.touch();
    }

    fn touch(&self) {
        let mut guard = self
            .inner
            .last_activity
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Utc::now();
    }

    #[cfg(test)]
    fn backdate(&self, by: Duration) {
        let mut guard = self.inner.last_activity.write().unwrap();
        *guard -= chrono::Duration::from_std(by).unwrap();
    }
}

/// Thread-safe store for sessions.
///
/// Provides methods for creating, retrieving, and cleaning up sessions.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

#[derive(Debug)]
struct SessionStoreInner {
    sessions: RwLock<HashMap<String, Session>>,
    idle_timeout: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Create a new session store with the default idle timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_SESSION_TIMEOUT)
    }

    /// Create a new session store that drops sessions idle for `idle_timeout`.
    #[must_use]
    pub fn with_timeout(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(SessionStoreInner {
                sessions: RwLock::new(HashMap::new()),
                idle_timeout,
            }),
        }
    }

    /// Idle timeout applied by [`cleanup_expired`](Self::cleanup_expired).
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        self.inner.idle_timeout
    }

    /// Create a new session and return it.
    ///
    /// Expired sessions are swept first.
    #[must_use]
    pub fn create(&self) -> Session {
        let removed = self.cleanup_expired();
        if removed > 0 {
            tracing::debug!(removed, "Dropped idle sessions");
        }

        let session = Session::new(Uuid::new_v4().to_string());
        self.sessions_mut()
            .insert(session.id().to_string(), session.clone());
        session
    }

    /// Get a session by ID.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Session> {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Remove a session by ID.
    pub fn remove(&self, id: &str) -> Option<Session> {
        self.sessions_mut().remove(id)
    }

    /// Get the number of active sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if there are no sessions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove sessions idle longer than the store's timeout.
    ///
    /// Returns the number of sessions removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_with_timeout(self.inner.idle_timeout)
    }

    /// Remove sessions that have been inactive longer than the timeout.
    pub fn cleanup_expired_with_timeout(&self, timeout: Duration) -> usize {
        let mut guard = self.sessions_mut();
        let before = guard.len();
        guard.retain(|_, session| !session.is_expired_with_timeout(timeout));
        before - guard.len()
    }

    fn sessions_mut(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Session>> {
        self.inner
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
