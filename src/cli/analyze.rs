//! `moodchat analyze` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::core::aggregator::{self, AnalysisOptions};
use crate::error::Result;
use crate::providers::{Classifier, build_classifier};
use crate::report;
use crate::storage::SessionStore;

/// Run the analyze command.
///
/// Classifies every user message of a saved session and prints the report.
///
/// # Errors
///
/// Returns an error if the session is not found or classification fails.
pub fn run(session_id: &str, top_k: Option<usize>, no_emotions: bool) -> Result<()> {
    let config = load_config()?;
    let store = open_store(&config)?;
    let classifier = build_classifier(&config.classifier)?;

    let mut options = config.analysis.options();
    if let Some(k) = top_k {
        options.key_moments = k;
    }
    if no_emotions {
        options.emotions = false;
    }

    print!("{}", analyze_session(&store, classifier.as_ref(), session_id, &options)?);
    Ok(())
}

fn analyze_session(
    store: &dyn SessionStore,
    classifier: &dyn Classifier,
    session_id: &str,
    options: &AnalysisOptions,
) -> Result<String> {
    let record = store.load_session(session_id)?;
    let analysis = aggregator::analyze(&record.turns, classifier, options)?;
    Ok(format!(
        "Session {} ({} messages)\n\n{}",
        record.session_id,
        record.turns.len(),
        report::render(&analysis)
    ))
}
