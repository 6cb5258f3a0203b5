//! Contracts for the external collaborators.

use crate::core::conversation::Turn;
use crate::core::sentiment::{EmotionDistribution, SentimentResult};
use crate::error::Result;

/// Produces the next assistant utterance for a conversation.
pub trait ResponseProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &str;

    /// Generate a reply to the last turn of `history`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Provider` on network, auth, quota or payload failures.
    fn generate(&self, history: &[Turn]) -> Result<String>;
}

/// Text classifier for sentiment and emotion.
pub trait Classifier: Send + Sync {
    /// Classifier name for logs.
    fn name(&self) -> &str;

    /// Sentiment label and confidence for one text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Classifier` if the call fails or returns a label
    /// outside the mapping table.
    fn classify(&self, text: &str) -> Result<SentimentResult>;

    /// Emotion distribution for one text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Classifier` if the call fails or returns a label
    /// outside the mapping table.
    fn classify_emotion(&self, text: &str) -> Result<EmotionDistribution>;
}
