// Read-only HTTP surface over the shared engine state
pub mod handlers;

use crate::engine::SharedState;
use crate::persistence::TradeLog;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub shared: Arc<SharedState>,
    pub trade_log: Arc<dyn TradeLog>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/signal", get(handlers::get_signal))
        .route("/api/weights", get(handlers::get_weights))
        .route("/api/trades", get(handlers::get_trades))
        .route("/api/position", get(handlers::get_position))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the task is dropped
pub async fn serve(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("🌐 API listening on http://{}", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
