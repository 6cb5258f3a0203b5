//! File-based storage backend.

use crate::core::session::SessionRecord;
use crate::error::{Error, Result};
use crate::storage::traits::{SessionStore, SessionSummary, most_recent};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-based storage backend with atomic writes.
///
/// Sessions live in `<base_dir>/sessions/<id>.json`.
#[derive(Debug)]
pub struct FileBackend {
    base_dir: PathBuf,
}

impl FileBackend {
    /// Create a new file backend.
    ///
    /// Creates the sessions directory if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions directory cannot be created.
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(base_dir.join("sessions"))?;
        Ok(Self { base_dir })
    }

    /// Directory holding the session files.
    #[must_use]
    pub fn sessions_dir(&self) -> PathBuf {
        self.base_dir.join("sessions")
    }

    /// Get the path to a session file.
    fn session_path(&self, session_id: &str) -> Result<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.sessions_dir().join(format!("{session_id}.json")))
    }
}

/// Session ids become file names, so only `[A-Za-z0-9_-]` is allowed.
fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid session id: {session_id:?}")))
    }
}

fn read_record(path: &Path) -> Result<SessionRecord> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

impl SessionStore for FileBackend {
    fn get_session(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let path = self.session_path(session_id)?;
        if !path.exists() {
            return Ok(None);
        }
        read_record(&path).map(Some)
    }

    fn put_session(&self, record: &SessionRecord) -> Result<()> {
        let path = self.session_path(&record.session_id)?;
        let temp = path.with_extension("tmp");

        // Write to temp file first
        let contents = serde_json::to_string_pretty(record)?;
        fs::write(&temp, &contents)?;

        // Atomic rename - a crash mid-write never leaves a truncated session
        fs::rename(&temp, &path)?;

        debug!(session = %record.session_id, path = %path.display(), "saved session");
        Ok(())
    }

    fn list_sessions(&self, limit: usize) -> Result<Vec<SessionSummary>> {
        let sessions_dir = self.sessions_dir();
        let mut sessions = Vec::new();

        if !sessions_dir.exists() {
            return Ok(sessions);
        }

        for entry in fs::read_dir(&sessions_dir)? {
            let path = entry?.path();

            // Only process .json files (skip .tmp files)
            if path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            match read_record(&path) {
                Ok(record) => sessions.push(SessionSummary::from(&record)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable session"),
            }
        }

        Ok(most_recent(sessions, limit))
    }

    fn delete_session(&self, session_id: &str) -> Result<()> {
        let path = self.session_path(session_id)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn create_test_backend() -> (FileBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        (backend, temp_dir)
    }

    fn record_with_message(id: &str, text: &str) -> SessionRecord {
        let mut record = SessionRecord::new(id);
        record.turns.append(Role::User, text).unwrap();
        record.turns.append(Role::Assistant, "ok").unwrap();
        record
    }

    #[test]
    fn creates_sessions_directory() {
        let temp_dir = TempDir::new().unwrap();
        let _backend = FileBackend::new(temp_dir.path().to_path_buf()).unwrap();
        assert!(temp_dir.path().join("sessions").exists());
    }

    #[test]
    fn get_missing_session() {
        let (store, _temp) = create_test_backend();
        assert!(store.get_session("nonexistent").unwrap().is_none());
        assert!(matches!(
            store.load_session("nonexistent"),
            Err(Error::SessionNotFound(_))
        ));
    }

    #[test]
    fn put_and_get_session() {
        let (store, _temp) = create_test_backend();
        let record = record_with_message("test-123", "hello");

        store.put_session(&record).unwrap();

        let retrieved = store.get_session("test-123").unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[test]
    fn atomic_write_creates_no_temp_file() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionRecord::new("test-123")).unwrap();

        let temp_path = temp_dir.path().join("sessions").join("test-123.tmp");
        assert!(!temp_path.exists());

        let main_path = temp_dir.path().join("sessions").join("test-123.json");
        assert!(main_path.exists());
    }

    #[test]
    fn rejects_path_like_session_ids() {
        let (store, _temp) = create_test_backend();
        for id in ["../escape", "a/b", "", "dot.json"] {
            assert!(matches!(
                store.get_session(id),
                Err(Error::Validation(_))
            ));
        }
    }

    #[test]
    fn list_sessions_empty() {
        let (store, _temp) = create_test_backend();
        assert!(store.list_sessions(10).unwrap().is_empty());
    }

    #[test]
    fn list_sessions_most_recent_first() {
        let (store, _temp) = create_test_backend();

        let mut older = record_with_message("older", "first");
        older.updated_at = Utc::now() - Duration::hours(2);
        store.put_session(&older).unwrap();
        store
            .put_session(&record_with_message("newer", "second"))
            .unwrap();

        let sessions = store.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].session_id, "newer");
        assert_eq!(sessions[0].first_message.as_deref(), Some("second"));
        assert_eq!(sessions[0].turn_count, 2);

        assert_eq!(store.list_sessions(1).unwrap().len(), 1);
    }

    #[test]
    fn list_sessions_ignores_tmp_files() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionRecord::new("session-1")).unwrap();

        let tmp_path = temp_dir.path().join("sessions").join("orphan.tmp");
        fs::write(&tmp_path, "{}").unwrap();

        let sessions = store.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "session-1");
    }

    #[test]
    fn delete_session_removes_file() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionRecord::new("test-123")).unwrap();

        let path = temp_dir.path().join("sessions").join("test-123.json");
        assert!(path.exists());

        store.delete_session("test-123").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn delete_nonexistent_session_succeeds() {
        let (store, _temp) = create_test_backend();
        store.delete_session("nonexistent").unwrap();
    }

    #[test]
    fn get_session_corrupted_returns_error() {
        let (store, temp_dir) = create_test_backend();
        let corrupted_path = temp_dir.path().join("sessions").join("corrupted.json");
        fs::write(&corrupted_path, "{ invalid }").unwrap();

        assert!(store.get_session("corrupted").is_err());
    }

    #[test]
    fn list_sessions_skips_unreadable_files() {
        let (store, temp_dir) = create_test_backend();
        store.put_session(&SessionRecord::new("valid-1")).unwrap();
        store.put_session(&SessionRecord::new("valid-2")).unwrap();

        let sessions_dir = temp_dir.path().join("sessions");
        fs::write(sessions_dir.join("corrupted.json"), "not json").unwrap();
        fs::write(sessions_dir.join("empty.json"), "").unwrap();
        fs::write(sessions_dir.join("partial.json"), r#"{"session_id": "partial", "turns": ["#)
            .unwrap();
        fs::write(
            sessions_dir.join("wrong-schema.json"),
            r#"{"name": "not a session", "value": 42}"#,
        )
        .unwrap();

        let sessions = store.list_sessions(10).unwrap();
        assert_eq!(sessions.len(), 2);
    }

    #[test]
    fn overwrite_replaces_previous_version() {
        let (store, _temp) = create_test_backend();

        let mut record = record_with_message("atomic-test", "initial");
        store.put_session(&record).unwrap();

        record.turns.append(Role::User, "updated").unwrap();
        store.put_session(&record).unwrap();

        let retrieved = store.get_session("atomic-test").unwrap().unwrap();
        assert_eq!(retrieved.turns.len(), 3);
    }
}
