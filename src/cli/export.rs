//! `moodchat export` command implementation.

use crate::cli::open_store;
use crate::config::load_config;
use crate::core::aggregator;
use crate::error::Result;
use crate::export::{self, ExportFormat};
use crate::providers::{Classifier, build_classifier};
use crate::storage::SessionStore;
use std::fs;
use std::path::Path;

/// Run the export command.
///
/// Writes to `output` when given, otherwise to stdout. With
/// `with_analysis`, user messages are classified first.
///
/// # Errors
///
/// Returns an error if the session is not found, classification fails, or
/// the output file cannot be written.
pub fn run(
    session_id: &str,
    format: &str,
    output: Option<&Path>,
    with_analysis: bool,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let config = load_config()?;
    let store = open_store(&config)?;

    let classifier = if with_analysis {
        Some(build_classifier(&config.classifier)?)
    } else {
        None
    };
    let options = config.analysis.options();
    let rendered = render(
        &store,
        session_id,
        format,
        classifier.as_deref().map(|c| (c, &options)),
    )?;

    match output {
        Some(path) => {
            fs::write(path, rendered)?;
            println!("Exported {session_id} to {}", path.display());
        }
        None => print!("{rendered}"),
    }
    Ok(())
}

fn render(
    store: &dyn SessionStore,
    session_id: &str,
    format: ExportFormat,
    analysis: Option<(&dyn Classifier, &aggregator::AnalysisOptions)>,
) -> Result<String> {
    let record = store.load_session(session_id)?;
    let analysis = analysis
        .map(|(classifier, options)| aggregator::analyze(&record.turns, classifier, options))
        .transpose()?;
    export::export(&record, analysis.as_ref(), format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregator::AnalysisOptions;
    use crate::core::conversation::Role;
    use crate::core::session::SessionRecord;
    use crate::error::Error;
    use crate::providers::LexiconClassifier;
    use crate::storage::MemoryBackend;

    fn store_with_session() -> MemoryBackend {
        let store = MemoryBackend::new();
        let mut record = SessionRecord::new("e-1");
        record.turns.append(Role::User, "I love this!").unwrap();
        record.turns.append(Role::Assistant, "Great").unwrap();
        store.put_session(&record).unwrap();
        store
    }

    #[test]
    fn csv_export_with_analysis() {
        let store = store_with_session();
        let lexicon = LexiconClassifier::new();
        let classifier: &dyn Classifier = &lexicon;
        let options = AnalysisOptions::default();
        let csv = render(
            &store,
            "e-1",
            ExportFormat::Csv,
            Some((classifier, &options)),
        )
        .unwrap();
        assert!(csv.contains("1,user,I love this!,positive,"));
        assert!(csv.contains("2,assistant,Great,N/A,N/A,N/A"));
    }

    #[test]
    fn json_export_without_analysis() {
        let store = store_with_session();
        let json = render(&store, "e-1", ExportFormat::Json, None).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(v["analysis"].is_null());
        assert_eq!(v["conversation"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn export_missing_session() {
        let store = MemoryBackend::new();
        assert!(matches!(
            render(&store, "none", ExportFormat::Json, None),
            Err(Error::SessionNotFound(_))
        ));
    }
}
