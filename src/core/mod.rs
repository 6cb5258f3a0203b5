//! Core conversation, sentiment, and session types.

pub mod aggregator;
pub mod alerts;
pub mod conversation;
pub mod sentiment;
pub mod session;

pub use aggregator::{AnalysisOptions, ConversationSentiment, Trend};
pub use alerts::{Alert, AlertMonitor, Severity};
pub use conversation::{ConversationStore, Role, Turn};
pub use sentiment::{EmotionDistribution, EmotionLabel, SentimentLabel, SentimentResult};
pub use session::{ChatSession, SessionRecord};
