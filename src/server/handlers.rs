use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use super::AppState;
use crate::decision::Weights;
use crate::error::EngineError;
use crate::execution::OpenPosition;
use crate::models::{EngineState, TradeRecord};

pub const DEFAULT_TRADES_LIMIT: i64 = 30;
pub const MAX_TRADES_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct TradesQuery {
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct WeightsResponse {
    weights: Weights,
}

#[derive(Debug, Serialize)]
pub struct TradesResponse {
    trades: Vec<TradeRecord>,
}

#[derive(Debug, Serialize)]
pub struct PositionResponse {
    position: Option<OpenPosition>,
}

/// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/signal - last completed cycle
pub async fn get_signal(State(state): State<Arc<AppState>>) -> Json<EngineState> {
    Json(state.shared.snapshot().as_ref().clone())
}

/// GET /api/weights - live module weights
pub async fn get_weights(State(state): State<Arc<AppState>>) -> Json<WeightsResponse> {
    Json(WeightsResponse {
        weights: state.shared.weights().as_ref().clone(),
    })
}

/// GET /api/position - open position or null
pub async fn get_position(State(state): State<Arc<AppState>>) -> Json<PositionResponse> {
    Json(PositionResponse {
        position: state.shared.position().as_ref().clone(),
    })
}

/// GET /api/trades?limit=N - most recent opened trades, limit clamped to [1, 200]
pub async fn get_trades(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TradesQuery>,
) -> Result<Json<TradesResponse>, (StatusCode, String)> {
    let limit = clamp_limit(query.limit);

    match state.trade_log.recent(limit).await {
        Ok(trades) => Ok(Json(TradesResponse { trades })),
        Err(e) => {
            let err = EngineError::TradeLog(e);
            warn!("{}", err);
            Err((StatusCode::SERVICE_UNAVAILABLE, err.to_string()))
        }
    }
}

pub fn clamp_limit(limit: Option<i64>) -> usize {
    limit
        .unwrap_or(DEFAULT_TRADES_LIMIT)
        .clamp(1, MAX_TRADES_LIMIT) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Weights;
    use crate::engine::SharedState;
    use crate::models::{Decision, Module, ModuleScores, Side};
    use crate::persistence::{MemoryTradeLog, TradeLog};
    use crate::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use chrono::Utc;
    use tower::ServiceExt;
    use uuid::Uuid;

    fn app_state() -> (Arc<AppState>, Arc<MemoryTradeLog>) {
        let log = Arc::new(MemoryTradeLog::new());
        let state = Arc::new(AppState {
            shared: Arc::new(SharedState::new(Weights::uniform(1.0))),
            trade_log: log.clone(),
        });
        (state, log)
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn seed_trades(log: &MemoryTradeLog, n: usize) {
        for i in 0..n {
            log.log_open(&TradeRecord {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
                side: Side::Long,
                entry: 100.0 + i as f64,
                stop_loss: 98.0,
                take_profit: 104.0,
                rr: 2.0,
                confidence: 0.8,
                modules: ModuleScores::new(),
            })
            .await
            .unwrap();
        }
    }

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), 30);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(10_000)), 200);
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = app_state();
        let (status, json) = get_json(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_signal_before_first_cycle() {
        let (state, _) = app_state();
        let (status, json) = get_json(state, "/api/signal").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["price"].is_null());
        assert!(json["decision"].is_null());
        assert_eq!(json["confidence"], 0.0);
    }

    #[tokio::test]
    async fn test_signal_reflects_published_state() {
        let (state, _) = app_state();
        let mut modules = ModuleScores::new();
        modules.set(Module::Rsi, 0.4);
        state.shared.publish_state(EngineState {
            price: Some(64000.0),
            decision: Some(Decision::Buy),
            confidence: 0.81,
            modules,
            ..EngineState::default()
        });

        let (_, json) = get_json(state, "/api/signal").await;
        assert_eq!(json["price"], 64000.0);
        assert_eq!(json["decision"], "BUY");
        assert_eq!(json["modules"]["rsi"], 0.4);
    }

    #[tokio::test]
    async fn test_weights_endpoint() {
        let (state, _) = app_state();
        let (_, json) = get_json(state, "/api/weights").await;

        assert_eq!(json["weights"]["market_state"], 1.0);
        assert_eq!(json["weights"].as_object().unwrap().len(), Module::ALL.len());
    }

    #[tokio::test]
    async fn test_trades_default_and_clamped_limit() {
        let (state, log) = app_state();
        seed_trades(&log, 40).await;

        let (status, json) = get_json(state.clone(), "/api/trades").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["trades"].as_array().unwrap().len(), 30);
        assert_eq!(json["trades"][0]["entry"], 139.0); // most recent first

        let (_, json) = get_json(state.clone(), "/api/trades?limit=0").await;
        assert_eq!(json["trades"].as_array().unwrap().len(), 1);

        let (_, json) = get_json(state, "/api/trades?limit=500").await;
        assert_eq!(json["trades"].as_array().unwrap().len(), 40);
    }

    #[tokio::test]
    async fn test_position_null_when_idle() {
        let (state, _) = app_state();
        let (status, json) = get_json(state, "/api/position").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json["position"].is_null());
    }
}
