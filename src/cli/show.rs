//! `moodchat show` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::error::Result;
use crate::storage::SessionStore;

/// Run the show command.
///
/// Prints the full saved session as pretty JSON.
///
/// # Errors
///
/// Returns an error if the storage backend fails or the session is not found.
pub fn run(session_id: &str) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    println!("{}", render(&store, session_id)?);
    Ok(())
}

fn render(store: &dyn SessionStore, session_id: &str) -> Result<String> {
    let record = store.load_session(session_id)?;
    Ok(serde_json::to_string_pretty(&record)?)
}
