//! Full pipeline over the synthetic feed with the real indicator set

use signalbot::api::{MarketData, MarketScenario, SyntheticFeed};
use signalbot::engine::{Engine, EngineConfig};
use signalbot::indicators::compute_indicators;
use signalbot::models::Module;
use signalbot::notify::LogNotifier;
use signalbot::persistence::MemoryTradeLog;
use std::sync::Arc;

#[tokio::test]
async fn test_real_indicators_over_synthetic_history() {
    let feed = SyntheticFeed::new(42, MarketScenario::Volatile);
    let bars = feed.recent_bars(240).await.unwrap();
    let frame = compute_indicators(&bars).unwrap();

    // EMA50 warmup drops the first 49 bars
    assert_eq!(frame.len(), 240 - 49);
    let last = frame.last().unwrap();
    assert!(last.atr_pct > 0.0);
    assert!((0.0..=100.0).contains(&last.rsi));
}

#[tokio::test]
async fn test_engine_cycles_over_synthetic_feed() {
    let mut engine = Engine::new(
        EngineConfig::default(),
        Arc::new(SyntheticFeed::new(7, MarketScenario::Sideways)),
        Arc::new(LogNotifier),
        Arc::new(MemoryTradeLog::new()),
    );

    for _ in 0..5 {
        let report = engine.run_cycle().await.unwrap();
        assert!((0.0..=1.0).contains(&report.confidence));
    }

    let state = engine.shared().snapshot();
    assert!(state.price.unwrap() > 0.0);
    assert_eq!(state.modules.len(), Module::ALL.len());
    for module in Module::ALL {
        let weight = engine.shared().weights().get(module);
        assert!((0.0..=2.0).contains(&weight));
    }
}
