//! Chat sessions and their persisted form.

use crate::core::aggregator::{self, AnalysisOptions, ConversationSentiment};
use crate::core::alerts::{Alert, AlertMonitor};
use crate::core::conversation::{ConversationStore, Role, Turn};
use crate::error::{Error, Result};
use crate::providers::{Classifier, ResponseProvider};
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

/// Generate a new session id: `session_YYYYMMDD_HHMMSS_xxxxxx`.
///
/// The random suffix keeps ids unique when two sessions start in the same
/// second.
#[must_use]
pub fn generate_session_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "session_{}_{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        &suffix[..6]
    )
}

/// Session as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Session identifier.
    pub session_id: String,

    /// When the session was created.
    pub created_at: DateTime<Utc>,

    /// When a turn was last added.
    pub updated_at: DateTime<Utc>,

    /// Conversation turns.
    pub turns: ConversationStore,
}

impl SessionRecord {
    /// Create an empty record.
    #[must_use]
    pub fn new(session_id: &str) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.to_string(),
            created_at: now,
            updated_at: now,
            turns: ConversationStore::new(),
        }
    }

    /// First user message, if any.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.turns
            .history()
            .iter()
            .find(|t| t.is_user())
            .map(Turn::text)
    }
}

/// A live chat session.
///
/// Owns its conversation exclusively; every operation takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    conversation: ConversationStore,
    alerts: AlertMonitor,
    analysis: Option<ConversationSentiment>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    /// Start a new session with a generated id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(&generate_session_id())
    }

    /// Start a new, empty session with the given id.
    #[must_use]
    pub fn with_id(id: &str) -> Self {
        Self::from_record(SessionRecord::new(id))
    }

    /// Resume a saved session.
    #[must_use]
    pub fn from_record(record: SessionRecord) -> Self {
        Self {
            id: record.session_id,
            created_at: record.created_at,
            updated_at: record.updated_at,
            conversation: record.turns,
            alerts: AlertMonitor::default(),
            analysis: None,
        }
    }

    /// Replace the alert monitor.
    #[must_use]
    pub fn with_alerts(mut self, alerts: AlertMonitor) -> Self {
        self.alerts = alerts;
        self
    }

    /// Snapshot for persistence.
    #[must_use]
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            session_id: self.id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            turns: self.conversation.clone(),
        }
    }

    /// Session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Turns recorded so far.
    #[must_use]
    pub fn conversation(&self) -> &ConversationStore {
        &self.conversation
    }

    /// Alert monitor and its history.
    #[must_use]
    pub fn alerts(&self) -> &AlertMonitor {
        &self.alerts
    }

    /// Send a user message and record the provider's reply.
    ///
    /// The provider sees the full history including the new message. If it
    /// fails, neither turn is recorded.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` for an empty message and `Error::Provider`
    /// if the provider fails or returns an empty reply.
    pub fn send(&mut self, provider: &dyn ResponseProvider, text: &str) -> Result<&Turn> {
        let user_turn = self.conversation.stage(Role::User, text)?;

        let mut pending = self.conversation.history().to_vec();
        pending.push(user_turn.clone());

        debug!(session = %self.id, provider = provider.name(), turns = pending.len(), "generating reply");
        let reply = provider.generate(&pending).inspect_err(|e| {
            warn!(session = %self.id, error = %e, "provider failed, turn discarded");
        })?;
        if reply.trim().is_empty() {
            return Err(Error::Provider(format!(
                "{} returned an empty reply",
                provider.name()
            )));
        }

        self.conversation.commit(user_turn)?;
        self.updated_at = Utc::now();
        self.conversation.append(Role::Assistant, reply)
    }

    /// Classify a single message and check it against the alert threshold.
    ///
    /// # Errors
    ///
    /// Returns `Error::Classifier` if classification fails.
    pub fn screen(&mut self, classifier: &dyn Classifier, text: &str) -> Result<Option<Alert>> {
        if !self.alerts.is_enabled() {
            return Ok(None);
        }
        let result = classifier.classify(text)?;
        Ok(self.alerts.check_result(&result, text).cloned())
    }

    /// Analyze the user turns, replacing any previous analysis.
    ///
    /// # Errors
    ///
    /// Returns `Error::ClassifierUnavailable` if any classification fails.
    /// The previous analysis is kept in that case.
    pub fn analyze(
        &mut self,
        classifier: &dyn Classifier,
        options: &AnalysisOptions,
    ) -> Result<&ConversationSentiment> {
        let analysis = aggregator::analyze(&self.conversation, classifier, options)?;
        Ok(self.analysis.insert(analysis))
    }

    /// Result of the last successful analysis. Not refreshed when turns are
    /// added.
    #[must_use]
    pub fn last_analysis(&self) -> Option<&ConversationSentiment> {
        self.analysis.as_ref()
    }

    /// Discard all turns, the last analysis, and the alert history.
    pub fn clear(&mut self) {
        self.conversation.clear();
        self.analysis = None;
        self.alerts.clear();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{EchoProvider, LexiconClassifier};

    struct FailingProvider;

    impl ResponseProvider for FailingProvider {
        fn name(&self) -> &str {
            "failing"
        }

        fn generate(&self, _history: &[Turn]) -> Result<String> {
            Err(Error::Provider("quota exceeded".to_string()))
        }
    }

    struct BlankProvider;

    impl ResponseProvider for BlankProvider {
        fn name(&self) -> &str {
            "blank"
        }

        fn generate(&self, _history: &[Turn]) -> Result<String> {
            Ok("   ".to_string())
        }
    }

    #[test]
    fn session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("session_"));
        // session_ + 8 date + _ + 6 time + _ + 6 suffix
        assert_eq!(id.len(), 8 + 8 + 1 + 6 + 1 + 6);
        assert_ne!(id, generate_session_id());
    }

    #[test]
    fn send_records_both_turns() {
        let mut session = ChatSession::with_id("s1");
        let reply = session.send(&EchoProvider::new(), "hello").unwrap();
        assert_eq!(reply.role(), Role::Assistant);
        assert_eq!(reply.sequence_index(), 1);
        assert_eq!(session.conversation().len(), 2);
        assert_eq!(session.conversation().history()[0].text(), "hello");
    }

    #[test]
    fn provider_failure_leaves_conversation_unchanged() {
        let mut session = ChatSession::with_id("s1");
        session.send(&EchoProvider::new(), "hello").unwrap();

        let err = session.send(&FailingProvider, "again").unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(session.conversation().len(), 2);

        let err = session.send(&BlankProvider, "again").unwrap_err();
        assert!(matches!(err, Error::Provider(_)));
        assert_eq!(session.conversation().len(), 2);
    }

    #[test]
    fn empty_message_is_rejected() {
        let mut session = ChatSession::with_id("s1");
        let err = session.send(&EchoProvider::new(), "  ").unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(session.conversation().is_empty());
    }

    #[test]
    fn analysis_is_stale_until_requested() {
        let mut session = ChatSession::with_id("s1");
        let classifier = LexiconClassifier::new();
        session.send(&EchoProvider::new(), "I love this!").unwrap();
        session
            .analyze(&classifier, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(session.last_analysis().unwrap().per_message.len(), 1);

        session.send(&EchoProvider::new(), "This is terrible").unwrap();
        assert_eq!(session.last_analysis().unwrap().per_message.len(), 1);

        session
            .analyze(&classifier, &AnalysisOptions::default())
            .unwrap();
        assert_eq!(session.last_analysis().unwrap().per_message.len(), 2);
    }

    #[test]
    fn screen_raises_alert_for_negative_message() {
        let mut session = ChatSession::with_id("s1");
        let classifier = LexiconClassifier::new();
        let alert = session
            .screen(&classifier, "This is terrible and awful")
            .unwrap();
        assert!(alert.is_some());
        assert!(session.screen(&classifier, "I love this!").unwrap().is_none());
        assert_eq!(session.alerts().history().len(), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = ChatSession::with_id("s1");
        session.send(&EchoProvider::new(), "hi").unwrap();
        session
            .analyze(&LexiconClassifier::new(), &AnalysisOptions::default())
            .unwrap();
        session.clear();
        assert!(session.conversation().is_empty());
        assert!(session.last_analysis().is_none());

        let reply = session.send(&EchoProvider::new(), "again").unwrap();
        assert_eq!(reply.sequence_index(), 1);
    }

    #[test]
    fn record_round_trip_keeps_turns() {
        let mut session = ChatSession::with_id("s1");
        session.send(&EchoProvider::new(), "hi there").unwrap();
        let record = session.to_record();
        assert_eq!(record.first_message(), Some("hi there"));

        let json = serde_json::to_string(&record).unwrap();
        let restored: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);

        let resumed = ChatSession::from_record(restored);
        assert_eq!(resumed.id(), "s1");
        assert_eq!(resumed.conversation().len(), 2);
    }

    #[test]
    fn record_with_index_gap_is_rejected() {
        let json = r#"{
            "session_id": "bad",
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z",
            "turns": [
                {"role": "user", "text": "hi", "sequence_index": 1, "timestamp": "2024-01-01T00:00:00Z"}
            ]
        }"#;
        assert!(serde_json::from_str::<SessionRecord>(json).is_err());
    }
}
