//! `moodchat clean` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::storage::SessionStore;
use chrono::{Duration, Utc};
use tracing::info;

/// Run the clean command.
///
/// Removes sessions not updated within the given duration. Without
/// `--before`, the configured retention period is used.
///
/// # Errors
///
/// Returns an error if the duration is invalid or the storage backend fails.
pub fn run(before: Option<&str>, all: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;

    let duration = if all {
        Duration::zero() // Clean everything
    } else {
        match before {
            Some(s) => parse_duration(s)?,
            None => Duration::days(i64::from(config.cleanup.retention_days)),
        }
    };

    let removed = clean_sessions(&store, duration)?;

    if removed == 0 {
        println!("No sessions to clean.");
    } else {
        println!("Cleaned {removed} session(s).");
    }

    Ok(())
}

/// Parse a duration string like "7d", "30d", "24h", "30m".
///
/// # Errors
///
/// Returns an error if the duration format is invalid.
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Ok(Duration::days(7)); // Default
    }

    let parse_err = |_| Error::Validation(format!("Invalid duration: {s}"));

    let (digits, unit): (&str, fn(i64) -> Duration) = if let Some(n) = s.strip_suffix('d') {
        (n, Duration::days)
    } else if let Some(n) = s.strip_suffix('h') {
        (n, Duration::hours)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, Duration::minutes)
    } else {
        // Default to days if no unit
        (s, Duration::days)
    };

    let num: i64 = digits.parse().map_err(parse_err)?;
    if num < 0 {
        return Err(Error::Validation(format!("Invalid duration: {s}")));
    }
    Ok(unit(num))
}

/// Delete sessions last updated before `now - before`.
fn clean_sessions(store: &dyn SessionStore, before: Duration) -> Result<usize> {
    let cutoff = Utc::now() - before;
    let sessions = store.list_sessions(usize::MAX)?;
    let mut removed = 0;

    for summary in sessions {
        if summary.updated_at > cutoff {
            continue; // Too recent
        }
        store.delete_session(&summary.session_id)?;
        info!(session = %summary.session_id, "removed session");
        removed += 1;
    }

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::SessionRecord;
    use crate::storage::MemoryBackend;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("7d").unwrap(), Duration::days(7));
        assert_eq!(parse_duration("24h").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("30m").unwrap(), Duration::minutes(30));
    }

    #[test]
    fn parse_duration_no_unit_defaults_to_days() {
        assert_eq!(parse_duration("14").unwrap(), Duration::days(14));
    }

    #[test]
    fn parse_duration_empty_defaults_to_7d() {
        assert_eq!(parse_duration("").unwrap(), Duration::days(7));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(matches!(parse_duration("soon"), Err(Error::Validation(_))));
        assert!(matches!(parse_duration("-3d"), Err(Error::Validation(_))));
    }

    #[test]
    fn clean_removes_old_sessions() {
        let store = MemoryBackend::new();

        let mut old = SessionRecord::new("old-session");
        old.updated_at = Utc::now() - Duration::days(10);
        store.put_session(&old).unwrap();
        store.put_session(&SessionRecord::new("recent-session")).unwrap();

        let removed = clean_sessions(&store, Duration::days(7)).unwrap();

        assert_eq!(removed, 1);
        assert!(store.get_session("old-session").unwrap().is_none());
        assert!(store.get_session("recent-session").unwrap().is_some());
    }

    #[test]
    fn clean_all_removes_everything() {
        let store = MemoryBackend::new();
        let mut record = SessionRecord::new("s1");
        record.updated_at = Utc::now() - Duration::seconds(1);
        store.put_session(&record).unwrap();

        assert_eq!(clean_sessions(&store, Duration::zero()).unwrap(), 1);
        assert!(store.list_sessions(10).unwrap().is_empty());
    }
}
