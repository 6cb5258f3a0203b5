//! moodchat - Terminal chat with conversation sentiment analysis.
//!
//! Replies come from a hosted language model; a separate text classifier
//! scores each user message, and the aggregator turns those scores into an
//! overall mood, a trend, and the conversation's key moments.

pub mod api;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod export;
pub mod providers;
pub mod report;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
