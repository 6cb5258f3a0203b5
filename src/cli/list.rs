//! `moodchat list` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::error::Result;
use crate::storage::{SessionStore, SessionSummary};
use chrono::{DateTime, Local, Utc};

/// Default number of sessions to show.
const DEFAULT_LIMIT: usize = 20;

/// Maximum length for message preview.
const MESSAGE_PREVIEW_LEN: usize = 40;

/// Run the list command.
///
/// Shows recent sessions with their IDs, last update, size, and first message.
///
/// # Errors
///
/// Returns an error if the storage backend fails.
pub fn run(limit: Option<usize>) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT);

    let sessions = store.list_sessions(limit)?;

    if sessions.is_empty() {
        println!("No sessions found.");
        println!("\nSessions are stored in: {}", store.sessions_dir().display());
        return Ok(());
    }

    println!(
        "{:<32} {:<17} {:>5}  First Message",
        "Session ID", "Updated", "Turns"
    );
    println!("{}", "─".repeat(100));

    for summary in &sessions {
        println!("{}", format_row(summary));
    }

    println!("{}", "─".repeat(100));
    println!("Showing {} session(s)", sessions.len());

    Ok(())
}

fn format_row(summary: &SessionSummary) -> String {
    format!(
        "{:<32} {:<17} {:>5}  {}",
        summary.session_id,
        format_local_time(summary.updated_at),
        summary.turn_count,
        format_message_preview(summary.first_message.as_deref())
    )
}

/// Format UTC time as local time for display.
fn format_local_time(utc: DateTime<Utc>) -> String {
    let local: DateTime<Local> = utc.into();
    local.format("%Y-%m-%d %H:%M").to_string()
}

/// First line of the message, truncated on a character boundary.
fn format_message_preview(message: Option<&str>) -> String {
    match message {
        Some(m) => {
            let first_line = m.lines().next().unwrap_or(m);
            if first_line.chars().count() > MESSAGE_PREVIEW_LEN {
                let cut: String = first_line.chars().take(MESSAGE_PREVIEW_LEN).collect();
                format!("{cut}...")
            } else {
                first_line.to_string()
            }
        }
        None => "(no messages)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conversation::Role;
    use crate::core::session::SessionRecord;

    #[test]
    fn row_shows_turns_and_preview() {
        let mut record = SessionRecord::new("session-1");
        record.turns.append(Role::User, "first message").unwrap();
        record.turns.append(Role::Assistant, "reply").unwrap();

        let row = format_row(&SessionSummary::from(&record));
        assert!(row.starts_with("session-1"));
        assert!(row.contains("    2  first message"));
    }

    #[test]
    fn format_message_preview_truncates_long_messages() {
        let long = "x".repeat(100);
        let preview = format_message_preview(Some(&long));
        assert_eq!(preview.len(), MESSAGE_PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn format_message_preview_handles_multibyte() {
        let long = "ü".repeat(100);
        let preview = format_message_preview(Some(&long));
        assert_eq!(preview.chars().count(), MESSAGE_PREVIEW_LEN + 3);
    }

    #[test]
    fn format_message_preview_handles_none() {
        assert_eq!(format_message_preview(None), "(no messages)");
    }

    #[test]
    fn format_message_preview_takes_first_line() {
        let multiline = "first line\nsecond line\nthird line";
        assert_eq!(format_message_preview(Some(multiline)), "first line");
    }
}
