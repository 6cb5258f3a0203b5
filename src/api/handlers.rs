//! Request handlers.
//!
//! Provider and classifier calls block, so each one runs on the blocking
//! thread pool.

use crate::api::ApiState;
use crate::api::error::{ApiError, ApiResult};
use crate::core::aggregator::{self, ConversationSentiment};
use crate::core::conversation::{ConversationStore, Role};
use crate::core::sentiment::{EmotionDistribution, EmotionLabel, SentimentLabel, SentimentScores};
use crate::core::session::{ChatSession, SessionRecord};
use crate::error::Result;
use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// One prior turn supplied by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    /// Who wrote the turn.
    pub role: Role,
    /// Turn text.
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// New user message.
    pub message: Option<String>,
    /// Earlier turns, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Body of `POST /api/sentiment` and `POST /api/emotion`.
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    /// Text to classify.
    pub text: Option<String>,
}

/// Body of `POST /api/summary`.
#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    /// Conversation to analyze, oldest first.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// Reply from the provider.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Assistant text.
    pub response: String,
}

/// Sentiment of one text, with its 0-100 score and explanation.
#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    /// Winning label.
    pub label: SentimentLabel,
    /// Probability of the winning label.
    pub confidence: f64,
    /// Full probability vector.
    pub scores: SentimentScores,
    /// Score on a 0-100 scale.
    pub score: u8,
    /// Short description of the sentiment.
    pub explanation: &'static str,
}

/// Emotion of one text.
#[derive(Debug, Serialize)]
pub struct EmotionResponse {
    /// Dominant emotion.
    pub label: EmotionLabel,
    /// Probability of the dominant emotion.
    pub confidence: f64,
    /// Probability per emotion.
    pub scores: EmotionDistribution,
}

/// Service status and the collaborators in use.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Response provider name.
    pub provider: String,
    /// Classifier name.
    pub classifier: String,
}

/// `GET /api/health`
pub async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider: state.provider.name().to_string(),
        classifier: state.classifier.name().to_string(),
    })
}

/// `POST /api/chat`: reply to `message` given the earlier `history`.
pub async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let message = required(request.message, "Message")?;
    let history = request.history;
    debug!(turns = history.len(), "chat request");
    let provider = Arc::clone(&state.provider);

    let response = run_blocking(move || {
        let record = SessionRecord {
            turns: conversation_from(history)?,
            ..SessionRecord::new("api")
        };
        let mut session = ChatSession::from_record(record);
        let reply = session.send(provider.as_ref(), &message)?;
        Ok(reply.text().to_string())
    })
    .await?;

    Ok(Json(ChatResponse { response }))
}

/// `POST /api/sentiment`
pub async fn sentiment(
    State(state): State<ApiState>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<SentimentResponse>> {
    let text = required(request.text, "Text")?;
    let classifier = Arc::clone(&state.classifier);

    let result = run_blocking(move || classifier.classify(&text)).await?;
    Ok(Json(SentimentResponse {
        label: result.label,
        confidence: result.confidence,
        scores: result.scores,
        score: result.score(),
        explanation: result.explanation(),
    }))
}

/// `POST /api/emotion`
pub async fn emotion(
    State(state): State<ApiState>,
    Json(request): Json<TextRequest>,
) -> ApiResult<Json<EmotionResponse>> {
    let text = required(request.text, "Text")?;
    let classifier = Arc::clone(&state.classifier);

    let distribution = run_blocking(move || classifier.classify_emotion(&text)).await?;
    Ok(Json(EmotionResponse {
        label: distribution.label(),
        confidence: distribution.confidence(),
        scores: distribution,
    }))
}

/// `POST /api/summary`: full analysis of the supplied conversation.
pub async fn summary(
    State(state): State<ApiState>,
    Json(request): Json<SummaryRequest>,
) -> ApiResult<Json<ConversationSentiment>> {
    if request.history.is_empty() {
        return Err(ApiError::bad_request("History is required"));
    }
    let history = request.history;
    let classifier = Arc::clone(&state.classifier);
    let options = state.options;

    let analysis = run_blocking(move || {
        let store = conversation_from(history)?;
        aggregator::analyze(&store, classifier.as_ref(), &options)
    })
    .await?;
    Ok(Json(analysis))
}

fn required(value: Option<String>, name: &str) -> ApiResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ApiError::bad_request(format!("{name} is required"))),
    }
}

fn conversation_from(history: Vec<HistoryEntry>) -> Result<ConversationStore> {
    let mut store = ConversationStore::new();
    for entry in history {
        store.append(entry.role, entry.content)?;
    }
    Ok(store)
}

async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal(format!("worker failed: {e}")))?
        .map_err(ApiError::from)
}
