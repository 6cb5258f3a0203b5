//! Google Gemini response provider.

use crate::config::ProviderConfig;
use crate::core::conversation::{Role, Turn};
use crate::error::{Error, Result};
use crate::providers::ResponseProvider;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Base URL of the Generative Language REST API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Response provider backed by the Gemini `generateContent` API.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    system_instruction: Option<String>,
}

impl GeminiProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the API key variable is unset, or
    /// `Error::Provider` if the HTTP client cannot be built.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let api_key = env::var(&config.api_key_env).map_err(|_| {
            Error::Config(format!(
                "{} environment variable is not set",
                config.api_key_env
            ))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Provider(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: config.model.clone(),
            api_key,
            system_instruction: config.system_instruction.clone(),
        })
    }

    /// Build the `generateContent` request body for a history.
    ///
    /// Assistant turns are sent with the `model` role.
    #[must_use]
    pub fn request_payload(&self, history: &[Turn]) -> Value {
        build_payload(history, self.system_instruction.as_deref())
    }
}

impl ResponseProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate(&self, history: &[Turn]) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let payload = self.request_payload(history);
        debug!(model = %self.model, turns = history.len(), "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .map_err(|e| Error::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Provider(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            let message = error_message(&body).unwrap_or_else(|| format!("HTTP {status}: {body}"));
            warn!(%status, "Gemini request failed");
            return Err(Error::Provider(format!("Gemini API error: {message}")));
        }

        parse_response_text(&body)
    }
}

fn build_payload(history: &[Turn], system_instruction: Option<&str>) -> Value {
    let contents: Vec<Value> = history
        .iter()
        .map(|turn| {
            let role = match turn.role() {
                Role::User => "user",
                Role::Assistant => "model",
            };
            json!({ "role": role, "parts": [{ "text": turn.text() }] })
        })
        .collect();

    let mut payload = json!({ "contents": contents });
    if let Some(system) = system_instruction {
        payload["systemInstruction"] = json!({ "parts": [{ "text": system }] });
    }
    payload
}

/// Extract the reply text from a `generateContent` response body.
fn parse_response_text(body: &str) -> Result<String> {
    let v: Value = serde_json::from_str(body)
        .map_err(|e| Error::Provider(format!("failed to parse response JSON: {e}")))?;

    if let Some(message) = v.get("error").map(|e| {
        e["message"]
            .as_str()
            .unwrap_or("unknown error")
            .to_string()
    }) {
        return Err(Error::Provider(format!("Gemini API error: {message}")));
    }

    let text: String = v["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = v["candidates"][0]["finishReason"]
            .as_str()
            .unwrap_or("no candidates");
        return Err(Error::Provider(format!("empty response ({reason})")));
    }
    Ok(text)
}

fn error_message(body: &str) -> Option<String> {
    let v: Value = serde_json::from_str(body).ok()?;
    v["error"]["message"].as_str().map(str::to_string)
}
