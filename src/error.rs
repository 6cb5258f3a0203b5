//! Error types for moodchat.

use std::io;
use thiserror::Error;

/// Result type alias for moodchat operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in moodchat operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Input rejected before it reached the conversation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The response provider failed (network, auth, quota, bad payload).
    #[error("Provider error: {0}")]
    Provider(String),

    /// A single classifier call failed.
    #[error("Classifier error: {0}")]
    Classifier(String),

    /// A classification batch was aborted at the first failing turn.
    #[error("Classifier unavailable at turn {sequence_index}: {reason}")]
    ClassifierUnavailable {
        /// Sequence index of the turn whose classification failed.
        sequence_index: usize,
        /// Underlying classifier failure.
        reason: String,
    },

    /// Storage I/O error.
    #[error("Storage error: {0}")]
    Storage(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Session not found.
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Export failed or was requested in an unknown format.
    #[error("Export error: {0}")]
    Export(String),

    /// The HTTP API could not be started.
    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// Whether the error came from an external collaborator.
    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Provider(_) | Self::Classifier(_) | Self::ClassifierUnavailable { .. }
        )
    }
}
