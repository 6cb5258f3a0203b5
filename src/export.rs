//! Conversation export to JSON and CSV.

use crate::core::aggregator::{ConversationSentiment, MessageSentiment};
use crate::core::session::SessionRecord;
use crate::error::{Error, Result};
use chrono::Utc;
use serde::Serialize;
use std::fmt::Write as _;
use std::str::FromStr;

/// Export format version written into JSON metadata.
pub const EXPORT_VERSION: &str = "1.0";

const CSV_HEADER: [&str; 6] = [
    "Message Number",
    "Role",
    "Message",
    "Sentiment",
    "Score",
    "Confidence",
];

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    /// File extension for the format.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(Error::Export(format!(
                "unsupported format: {other} (expected json or csv)"
            ))),
        }
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    export_date: String,
    version: &'static str,
    session_id: &'a str,
    created_at: String,
    updated_at: String,
    message_count: usize,
}

#[derive(Serialize)]
struct ExportedTurn<'a> {
    sequence_index: usize,
    role: String,
    content: &'a str,
    timestamp: String,
}

#[derive(Serialize)]
struct JsonExport<'a> {
    metadata: Metadata<'a>,
    conversation: Vec<ExportedTurn<'a>>,
    analysis: Option<&'a ConversationSentiment>,
}

/// Render a session in the given format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export(
    record: &SessionRecord,
    analysis: Option<&ConversationSentiment>,
    format: ExportFormat,
) -> Result<String> {
    match format {
        ExportFormat::Json => to_json(record, analysis),
        ExportFormat::Csv => Ok(to_csv(record, analysis)),
    }
}

/// Render `{metadata, conversation, analysis}` as pretty JSON.
///
/// # Errors
///
/// Returns `Error::Serde` if serialization fails.
pub fn to_json(record: &SessionRecord, analysis: Option<&ConversationSentiment>) -> Result<String> {
    let document = JsonExport {
        metadata: Metadata {
            export_date: Utc::now().to_rfc3339(),
            version: EXPORT_VERSION,
            session_id: &record.session_id,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
            message_count: record.turns.len(),
        },
        conversation: record
            .turns
            .history()
            .iter()
            .map(|turn| ExportedTurn {
                sequence_index: turn.sequence_index(),
                role: turn.role().to_string(),
                content: turn.text(),
                timestamp: turn.timestamp().to_rfc3339(),
            })
            .collect(),
        analysis,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// Render one CSV row per turn.
///
/// User rows carry the aligned sentiment when an analysis is given; every
/// other cell is `N/A`.
#[must_use]
pub fn to_csv(record: &SessionRecord, analysis: Option<&ConversationSentiment>) -> String {
    let mut out = String::new();
    push_row(&mut out, &CSV_HEADER);

    for turn in record.turns.history() {
        let sentiment = analysis.and_then(|a| find_message(&a.per_message, turn.sequence_index()));
        let (label, score, confidence) = match sentiment {
            Some(m) if turn.is_user() => (
                m.result.label.to_string(),
                m.result.score().to_string(),
                format!("{:.2}%", m.result.confidence * 100.0),
            ),
            _ => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
        };
        let number = (turn.sequence_index() + 1).to_string();
        let role = turn.role().to_string();
        push_row(
            &mut out,
            &[&number, &role, turn.text(), &label, &score, &confidence],
        );
    }
    out
}

fn find_message(per_message: &[MessageSentiment], sequence_index: usize) -> Option<&MessageSentiment> {
    per_message
        .iter()
        .find(|m| m.sequence_index == sequence_index)
}

fn push_row(out: &mut String, cells: &[&str]) {
    let row = cells
        .iter()
        .map(|cell| escape_csv(cell))
        .collect::<Vec<_>>()
        .join(",");
    // Writing to a String cannot fail
    let _ = write!(out, "{row}\r\n");
}

/// Quote a field if it contains a delimiter, quote, or line break.
fn escape_csv(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
