//! Hugging Face inference API classifier.

use crate::config::ClassifierConfig;
use crate::core::sentiment::{
    EmotionDistribution, EmotionLabel, SentimentLabel, SentimentResult, SentimentScores,
};
use crate::error::{Error, Result};
use crate::providers::Classifier;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use std::env;
use std::time::Duration;
use tracing::{debug, warn};

/// Hosted inference endpoint; the model id is appended as a path.
pub const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models";

/// Default sentiment model.
pub const DEFAULT_SENTIMENT_MODEL: &str = "cardiffnlp/twitter-roberta-base-sentiment-latest";

/// Default emotion model.
pub const DEFAULT_EMOTION_MODEL: &str = "j-hartmann/emotion-english-distilroberta-base";

/// One label/score pair in a text-classification response.
#[derive(Debug, Clone, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

/// Responses come back nested (one list per input) or flat.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Batched(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl ClassificationResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            Self::Batched(mut batches) => {
                if batches.is_empty() {
                    Vec::new()
                } else {
                    batches.swap_remove(0)
                }
            }
            Self::Flat(scores) => scores,
        }
    }
}

/// Classifier calling the Hugging Face text-classification API.
pub struct HuggingFaceClassifier {
    client: Client,
    endpoint: String,
    sentiment_model: String,
    emotion_model: String,
    token: Option<String>,
}

impl HuggingFaceClassifier {
    /// Create a classifier from configuration.
    ///
    /// The API token is optional; anonymous requests are heavily rate limited.
    ///
    /// # Errors
    ///
    /// Returns `Error::Classifier` if the HTTP client cannot be built.
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let token = env::var(&config.api_key_env).ok();
        if token.is_none() {
            warn!(
                var = %config.api_key_env,
                "no Hugging Face token set, using anonymous requests"
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Classifier(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            sentiment_model: config.sentiment_model.clone(),
            emotion_model: config.emotion_model.clone(),
            token,
        })
    }

    fn infer(&self, model: &str, text: &str) -> Result<Vec<LabelScore>> {
        let url = format!("{}/{model}", self.endpoint);
        debug!(%model, chars = text.len(), "sending classification request");

        let mut request = self.client.post(&url).json(&json!({
            "inputs": text,
            "options": { "wait_for_model": true },
        }));
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .map_err(|e| Error::Classifier(format!("HTTP request failed: {e}")))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| Error::Classifier(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(Error::Classifier(format!("{model}: HTTP {status}: {body}")));
        }
        parse_scores(&body)
    }
}

impl Classifier for HuggingFaceClassifier {
    fn name(&self) -> &str {
        "huggingface"
    }

    fn classify(&self, text: &str) -> Result<SentimentResult> {
        if text.trim().is_empty() {
            return Ok(SentimentResult::neutral());
        }
        let scores = self.infer(&self.sentiment_model, text)?;
        sentiment_from_scores(&scores)
    }

    fn classify_emotion(&self, text: &str) -> Result<EmotionDistribution> {
        if text.trim().is_empty() {
            return Ok(EmotionDistribution::from_pairs([(EmotionLabel::Neutral, 1.0)]));
        }
        let scores = self.infer(&self.emotion_model, text)?;
        emotion_from_scores(&scores)
    }
}

fn parse_scores(body: &str) -> Result<Vec<LabelScore>> {
    let response: ClassificationResponse = serde_json::from_str(body)
        .map_err(|e| Error::Classifier(format!("unexpected response: {e}")))?;
    let scores = response.into_scores();
    if scores.is_empty() {
        return Err(Error::Classifier("response contained no labels".to_string()));
    }
    Ok(scores)
}

fn sentiment_from_scores(scores: &[LabelScore]) -> Result<SentimentResult> {
    let mut mapped = SentimentScores {
        negative: 0.0,
        neutral: 0.0,
        positive: 0.0,
    };
    for s in scores {
        let label = SentimentLabel::from_raw(&s.label)
            .ok_or_else(|| Error::Classifier(format!("unknown sentiment label: {}", s.label)))?;
        match label {
            SentimentLabel::Negative => mapped.negative += s.score,
            SentimentLabel::Neutral => mapped.neutral += s.score,
            SentimentLabel::Positive => mapped.positive += s.score,
        }
    }
    Ok(SentimentResult::from_scores(mapped))
}

fn emotion_from_scores(scores: &[LabelScore]) -> Result<EmotionDistribution> {
    let pairs = scores
        .iter()
        .map(|s| {
            EmotionLabel::from_raw(&s.label)
                .map(|label| (label, s.score))
                .ok_or_else(|| Error::Classifier(format!("unknown emotion label: {}", s.label)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(EmotionDistribution::from_pairs(pairs))
}
