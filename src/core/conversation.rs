//! Conversation turns and the per-session turn store.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The response provider.
    Assistant,
}

impl Role {
    /// Speaker label used in transcripts.
    #[must_use]
    pub fn speaker(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Assistant => f.write_str("assistant"),
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    text: String,
    sequence_index: usize,
    timestamp: DateTime<Utc>,
}

impl Turn {
    /// Who wrote the turn.
    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    /// Message text (never empty).
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Position in the full history, starting at 0.
    #[must_use]
    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }

    /// When the turn was created.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Whether the turn was written by the user.
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Ordered, append-only list of turns for a single session.
///
/// Sequence indices are always `0..len` with no gaps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Turn>", into = "Vec<Turn>")]
pub struct ConversationStore {
    turns: Vec<Turn>,
}

impl ConversationStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `text` is empty or whitespace-only.
    /// The store is unchanged on failure.
    pub fn append(&mut self, role: Role, text: impl Into<String>) -> Result<&Turn> {
        let turn = self.stage(role, text)?;
        self.commit(turn)
    }

    /// Build the next turn without adding it to the history.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if `text` is empty or whitespace-only.
    pub fn stage(&self, role: Role, text: impl Into<String>) -> Result<Turn> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(Error::Validation(format!("{role} message is empty")));
        }
        Ok(Turn {
            role,
            text,
            sequence_index: self.turns.len(),
            timestamp: Utc::now(),
        })
    }

    /// Add a previously staged turn.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` if another turn was appended since the
    /// turn was staged.
    pub fn commit(&mut self, turn: Turn) -> Result<&Turn> {
        if turn.sequence_index != self.turns.len() {
            return Err(Error::Validation(format!(
                "stale turn: index {} but next index is {}",
                turn.sequence_index,
                self.turns.len()
            )));
        }
        self.turns.push(turn);
        Ok(&self.turns[self.turns.len() - 1])
    }

    /// Full history in order.
    #[must_use]
    pub fn history(&self) -> &[Turn] {
        &self.turns
    }

    /// User turns in order.
    #[must_use]
    pub fn user_turns(&self) -> Vec<&Turn> {
        self.turns.iter().filter(|t| t.is_user()).collect()
    }

    /// Number of user turns.
    #[must_use]
    pub fn user_turn_count(&self) -> usize {
        self.turns.iter().filter(|t| t.is_user()).count()
    }

    /// Total number of turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Discard every turn. Indexing restarts at 0.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Render the history as `Speaker: text` lines.
    #[must_use]
    pub fn transcript(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("{}: {}", t.role.speaker(), t.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl TryFrom<Vec<Turn>> for ConversationStore {
    type Error = Error;

    fn try_from(turns: Vec<Turn>) -> Result<Self> {
        for (expected, turn) in turns.iter().enumerate() {
            if turn.sequence_index != expected {
                return Err(Error::Validation(format!(
                    "turn at position {expected} has index {}",
                    turn.sequence_index
                )));
            }
            if turn.text.trim().is_empty() {
                return Err(Error::Validation(format!("turn {expected} is empty")));
            }
        }
        Ok(Self { turns })
    }
}

impl From<ConversationStore> for Vec<Turn> {
    fn from(store: ConversationStore) -> Self {
        store.turns
    }
}
