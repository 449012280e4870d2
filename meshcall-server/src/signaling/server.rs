use crate::config::RelayConfig;
use crate::relay::RelayService;
use crate::signaling::ws_handler;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(service: RelayService) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(service)
}

/// Serves the relay on an already bound listener until the task is dropped.
pub async fn serve_on(listener: TcpListener, service: RelayService) -> Result<()> {
    let addr = listener.local_addr()?;
    info!("Relay listening on ws://{}/ws", addr);
    axum::serve(listener, router(service))
        .await
        .context("Relay server stopped")
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    serve_on(listener, RelayService::new()).await
}
