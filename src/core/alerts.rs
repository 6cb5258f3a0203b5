//! Low-mood alerts.
//!
//! The monitor compares each user message's 0-100 sentiment score against a
//! threshold and records an alert whenever the score falls below it.

use crate::config::AlertConfig;
use crate::core::sentiment::SentimentResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Default alert threshold on the 0-100 score.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 30.0;

/// How far below normal a score is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity for a score: critical below 10, high below 20, medium below 30.
    #[must_use]
    pub fn for_score(score: f64) -> Self {
        if score < 10.0 {
            Self::Critical
        } else if score < 20.0 {
            Self::High
        } else if score < 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded low-mood alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,

    /// Score that triggered it.
    pub score: f64,

    /// Threshold in force at the time.
    pub threshold: f64,

    /// Message that was scored, if known.
    pub message: Option<String>,

    /// Severity bucket.
    pub severity: Severity,
}

/// Tracks alert settings and history for one session.
#[derive(Debug, Clone)]
pub struct AlertMonitor {
    threshold: f64,
    enabled: bool,
    history: Vec<Alert>,
}

impl Default for AlertMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_THRESHOLD)
    }
}

impl AlertMonitor {
    /// Create an enabled monitor with the given threshold.
    ///
    /// Out-of-range thresholds fall back to the default.
    #[must_use]
    pub fn new(threshold: f64) -> Self {
        let mut monitor = Self {
            threshold: DEFAULT_ALERT_THRESHOLD,
            enabled: true,
            history: Vec::new(),
        };
        monitor.set_threshold(threshold);
        monitor
    }

    /// Create a monitor from configuration.
    #[must_use]
    pub fn from_config(config: &AlertConfig) -> Self {
        let mut monitor = Self::new(config.threshold);
        monitor.enabled = config.enabled;
        monitor
    }

    /// Check a raw score. Returns the alert if one was raised.
    pub fn check(&mut self, score: f64, message: Option<&str>) -> Option<&Alert> {
        if !self.enabled || score >= self.threshold {
            return None;
        }

        let alert = Alert {
            timestamp: Utc::now(),
            score,
            threshold: self.threshold,
            message: message.map(str::to_string),
            severity: Severity::for_score(score),
        };
        info!(score, severity = %alert.severity, "low mood alert");
        self.history.push(alert);
        self.history.last()
    }

    /// Check a classified message.
    pub fn check_result(&mut self, result: &SentimentResult, message: &str) -> Option<&Alert> {
        self.check(f64::from(result.score()), Some(message))
    }

    /// Set the threshold. Values outside 0-100 are ignored.
    ///
    /// Returns whether the threshold was changed.
    pub fn set_threshold(&mut self, threshold: f64) -> bool {
        if (0.0..=100.0).contains(&threshold) {
            self.threshold = threshold;
            true
        } else {
            false
        }
    }

    /// Current threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Alerts raised so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[Alert] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }
}
