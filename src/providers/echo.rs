//! Offline response provider.
//!
//! Replies without calling any API. Useful for trying the chat loop and
//! sentiment reports without credentials.

use crate::core::conversation::Turn;
use crate::error::{Error, Result};
use crate::providers::ResponseProvider;

/// Provider that echoes the latest user turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProvider;

impl EchoProvider {
    /// Create an echo provider.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ResponseProvider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    fn generate(&self, history: &[Turn]) -> Result<String> {
        let last = history
            .iter()
            .rev()
            .find(|t| t.is_user())
            .ok_or_else(|| Error::Provider("no user turn to reply to".to_string()))?;
        let earlier = history.len() - 1;
        Ok(format!(
            "[echo] You said: \"{}\" ({earlier} earlier turn(s))",
            last.text()
        ))
    }
}
