//! In-memory storage backend for testing.

use crate::core::session::SessionRecord;
use crate::error::Result;
use crate::storage::traits::{SessionStore, SessionSummary, most_recent};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// In-memory storage backend for testing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryBackend {
    /// Create a new in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryBackend {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        Ok(sessions.get(session_id).cloned())
    }

    fn put_session(&self, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let summaries = sessions.values().map(SessionSummary::from).collect();
        Ok(most_recent(summaries, limit))
    }

    fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(session_id);
        Ok(())
    }
}
