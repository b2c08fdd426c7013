//! HTTP surface
//!
//! `POST /generate` takes a multipart form (`image`, `text`, optional
//! `language`) and answers with the generated PNG. `GET /` describes the
//! service.

mod error;
mod handlers;

pub use error::{status_for, ApiError};

use crate::processor::ProcessorState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use tracing::info;

/// Shared state of the HTTP handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub processor: ProcessorState,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    #[must_use]
    pub fn new(processor: ProcessorState) -> Self {
        Self {
            processor,
            started_at: Utc::now(),
        }
    }
}

/// Build the router
#[must_use]
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/generate", post(handlers::generate))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Serve `router` on `address` until Ctrl-C
pub async fn serve(address: &str, router: Router) -> anyhow::Result<()> {
    use anyhow::Context;

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!(address = %address, "🌐 StyleText API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
