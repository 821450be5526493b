//! HTTP endpoints for anonchat-relay.
//!
//! Process hosts poll `/`; operators read `/health` and `/metrics`.

mod metrics;
mod status;

use crate::config::HttpConfig;
use crate::server::ChatRelay;
use axum::{routing::get, Extension, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

pub use status::{HealthStatus, BANNER};

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<ChatRelay>) -> Router {
    Router::new()
        .route("/", get(status::banner_handler))
        .route("/health", get(status::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(relay))
}

/// Bind the listener for the configured address.
pub async fn bind(config: &HttpConfig) -> crate::Result<TcpListener> {
    let listener = TcpListener::bind(&config.bind_address).await?;
    tracing::info!("HTTP endpoints listening on {}", listener.local_addr()?);
    Ok(listener)
}
