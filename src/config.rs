//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`MOODCHAT_*`), including any loaded from `.env`
//! 2. Config file (`~/.moodchat/config.toml`)
//! 3. Defaults

use crate::core::aggregator::{AnalysisOptions, DEFAULT_KEY_MOMENTS, DEFAULT_TREND_THRESHOLD};
use crate::core::alerts::DEFAULT_ALERT_THRESHOLD;
use crate::error::{Error, Result};
use crate::providers::huggingface::{
    DEFAULT_EMOTION_MODEL, DEFAULT_ENDPOINT, DEFAULT_SENTIMENT_MODEL,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Response provider configuration.
    pub provider: ProviderConfig,

    /// Classifier configuration.
    pub classifier: ClassifierConfig,

    /// Analysis configuration.
    pub analysis: AnalysisConfig,

    /// Low-mood alert configuration.
    pub alerts: AlertConfig,

    /// Cleanup configuration.
    pub cleanup: CleanupConfig,

    /// HTTP API configuration.
    pub server: ServerConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the moodchat home directory.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_moodchat_home(),
        }
    }
}

/// Which response provider to use.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini (default).
    #[default]
    Gemini,

    /// Offline echo provider.
    Echo,
}

/// Response provider configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider backend.
    pub kind: ProviderKind,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_seconds: u64,

    /// Override for the API base URL.
    pub base_url: Option<String>,

    /// Optional system instruction sent with every request.
    pub system_instruction: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Gemini,
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_seconds: 60,
            base_url: None,
            system_instruction: None,
        }
    }
}

/// Which classifier to use.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Hugging Face inference API.
    #[serde(alias = "hf")]
    HuggingFace,

    /// Offline keyword lexicon (default).
    #[default]
    Lexicon,
}

/// Classifier configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Classifier backend.
    pub kind: ClassifierKind,

    /// Sentiment model id.
    pub sentiment_model: String,

    /// Emotion model id.
    pub emotion_model: String,

    /// Inference endpoint; the model id is appended.
    pub endpoint: String,

    /// Environment variable holding the API token.
    pub api_key_env: String,

    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Lexicon,
            sentiment_model: DEFAULT_SENTIMENT_MODEL.to_string(),
            emotion_model: DEFAULT_EMOTION_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key_env: "HF_API_TOKEN".to_string(),
            timeout_seconds: 30,
        }
    }
}

/// Analysis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Minimum change in mean mood between halves to call a trend.
    pub trend_threshold: f64,

    /// Number of key moments to report.
    pub key_moments: usize,

    /// Whether to run emotion classification.
    pub emotions: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            trend_threshold: DEFAULT_TREND_THRESHOLD,
            key_moments: DEFAULT_KEY_MOMENTS,
            emotions: true,
        }
    }
}

impl AnalysisConfig {
    /// Convert to aggregator options.
    #[must_use]
    pub fn options(&self) -> AnalysisOptions {
        AnalysisOptions {
            trend_threshold: self.trend_threshold,
            key_moments: self.key_moments,
            emotions: self.emotions,
        }
    }
}

/// Low-mood alert configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Whether alerts are raised.
    pub enabled: bool,

    /// Scores below this value (0-100) raise an alert.
    pub threshold: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: DEFAULT_ALERT_THRESHOLD,
        }
    }
}

/// Cleanup configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Default age for `moodchat clean`, in days.
    pub retention_days: u32,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self { retention_days: 7 }
    }
}

/// HTTP API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address `moodchat serve` listens on.
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:5000".to_string(),
        }
    }
}

fn default_moodchat_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".moodchat"), |h| h.join(".moodchat"))
}

/// Get the moodchat home directory.
///
/// Uses `MOODCHAT_HOME` if set, otherwise `~/.moodchat`.
#[must_use]
pub fn get_moodchat_home() -> PathBuf {
    env::var("MOODCHAT_HOME").map_or_else(|_| default_moodchat_home(), PathBuf::from)
}

/// Load a `.env` file into the process environment.
///
/// `<home>/.env` is preferred over `.env` in the current directory. Variables
/// that are already set keep their values. Returns the file that was loaded.
pub fn load_env_file(home: &Path) -> Option<PathBuf> {
    let home_env = home.join(".env");
    if home_env.exists() {
        return dotenvy::from_path(&home_env).ok().map(|()| home_env);
    }
    dotenvy::dotenv().ok()
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = parse_config(&contents)?;
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Parse a TOML config document.
///
/// # Errors
///
/// Returns `Error::Config` if the document is invalid.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("MOODCHAT_CONFIG") {
        return PathBuf::from(path);
    }
    get_moodchat_home().join("config.toml")
}

/// Apply environment variable overrides to config.
fn apply_env_overrides(config: &mut Config) {
    // Storage path
    if let Ok(path) = env::var("MOODCHAT_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Ok(home) = env::var("MOODCHAT_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    // Provider
    if let Ok(kind) = env::var("MOODCHAT_PROVIDER") {
        match kind.to_lowercase().as_str() {
            "gemini" => config.provider.kind = ProviderKind::Gemini,
            "echo" => config.provider.kind = ProviderKind::Echo,
            _ => {}
        }
    }

    if let Ok(model) = env::var("MOODCHAT_MODEL") {
        config.provider.model = model;
    }

    // Classifier
    if let Ok(kind) = env::var("MOODCHAT_CLASSIFIER") {
        match kind.to_lowercase().as_str() {
            "huggingface" | "hf" => config.classifier.kind = ClassifierKind::HuggingFace,
            "lexicon" => config.classifier.kind = ClassifierKind::Lexicon,
            _ => {}
        }
    }

    // Alerts
    if let Ok(val) = env::var("MOODCHAT_ALERT_THRESHOLD") {
        if let Ok(threshold) = val.parse() {
            config.alerts.threshold = threshold;
        }
    }

    // Cleanup
    if let Ok(val) = env::var("MOODCHAT_RETENTION_DAYS") {
        if let Ok(days) = val.parse() {
            config.cleanup.retention_days = days;
        }
    }

    if let Ok(bind) = env::var("MOODCHAT_BIND") {
        config.server.bind = bind;
    }
}
