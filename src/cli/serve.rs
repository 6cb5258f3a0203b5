//! `moodchat serve` command implementation.

use crate::api::{self, ApiState};
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::providers::{build_classifier, build_provider};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Run the HTTP API until Ctrl-C.
///
/// The provider and classifier are built before the runtime starts; their
/// blocking HTTP clients must not be created on an async thread.
///
/// # Errors
///
/// Returns an error if configuration or the collaborators cannot be set up,
/// or if the address cannot be bound.
pub fn run(bind: Option<&str>) -> Result<()> {
    let config = load_config()?;
    let state = ApiState::new(
        Arc::from(build_provider(&config.provider)?),
        Arc::from(build_classifier(&config.classifier)?),
        config.analysis.options(),
    );
    let addr = bind.unwrap_or(&config.server.bind).to_string();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| Error::Server(format!("cannot start runtime: {e}")))?;

    let app_state = state.clone();
    runtime.block_on(async move {
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(format!("cannot bind {addr}: {e}")))?;
        println!("moodchat API listening on http://{addr}/api");
        api::serve(listener, app_state).await
    })
}
