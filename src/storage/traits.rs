//! Storage trait definitions.

use crate::core::session::SessionRecord;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};

/// Storage backend for saved chat sessions.
pub trait SessionStore: Send + Sync {
    /// Get a session by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Save a session, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn put_session(&self, record: &SessionRecord) -> Result<()>;

    /// List recent sessions, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>>;

    /// Delete a session. Deleting a missing session is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    fn delete_session(&self, session_id: &str) -> Result<()>;

    /// Get a session that must exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` if there is no such session.
    fn load_session(&self, session_id: &str) -> Result<SessionRecord> {
        self.get_session(session_id)?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))
    }
}

/// Summary information for a session.
#[derive(Debug, Clone)]
pub struct SessionSummary {
    /// Session identifier.
    pub session_id: String,

    /// First user message (if any).
    pub first_message: Option<String>,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,

    /// Number of turns.
    pub turn_count: usize,
}

impl From<&SessionRecord> for SessionSummary {
    fn from(record: &SessionRecord) -> Self {
        Self {
            session_id: record.session_id.clone(),
            first_message: record.first_message().map(str::to_string),
            created_at: record.created_at,
            updated_at: record.updated_at,
            turn_count: record.turns.len(),
        }
    }
}

/// Sort summaries most recently updated first and keep `limit` of them.
pub(crate) fn most_recent(mut sessions: Vec<SessionSummary>, limit: usize) -> Vec<SessionSummary> {
    sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sessions.truncate(limit);
    sessions
}
