//! JSON HTTP API over the response provider and classifier.
//!
//! Routes, all under `/api`:
//! - `GET /health`
//! - `POST /chat` with `{message, history}`
//! - `POST /sentiment` and `POST /emotion` with `{text}`
//! - `POST /summary` with `{history}`
//!
//! Missing input is a 400; a failing provider or classifier is a 500. The
//! API is stateless: nothing is written to the session store.

pub mod error;
pub mod handlers;

use crate::core::aggregator::AnalysisOptions;
use crate::error::{Error, Result};
use crate::providers::{Classifier, ResponseProvider};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub use error::{ApiError, ApiResult};

/// Shared handler state.
#[derive(Clone)]
pub struct ApiState {
    provider: Arc<dyn ResponseProvider>,
    classifier: Arc<dyn Classifier>,
    options: AnalysisOptions,
}

impl ApiState {
    /// Bundle the collaborators the handlers call.
    #[must_use]
    pub fn new(
        provider: Arc<dyn ResponseProvider>,
        classifier: Arc<dyn Classifier>,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            provider,
            classifier,
            options,
        }
    }
}

/// Build the router with every route nested under `/api`.
pub fn router(state: ApiState) -> Router {
    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/sentiment", post(handlers::sentiment))
        .route("/emotion", post(handlers::emotion))
        .route("/summary", post(handlers::summary))
        .with_state(state);
    Router::new().nest("/api", api)
}

/// Serve the API on `listener` until Ctrl-C.
///
/// # Errors
///
/// Returns `Error::Server` if the server fails.
pub async fn serve(listener: TcpListener, state: ApiState) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "api listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

async fn shutdown_signal() {
    // A failed handler install just means no graceful shutdown
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down");
}
