// Engine loop
// fetch → indicators → module scores → decision → publish → open/close → feedback
pub mod state;

pub use state::SharedState;

use crate::api::{normalize_bars, MarketData};
use crate::config::Settings;
use crate::decision::DecisionEngine;
use crate::error::EngineError;
use crate::execution::{ClosedPosition, ExitReason, PositionTracker};
use crate::indicators::{IndicatorSource, StandardIndicators};
use crate::models::{Decision, EngineState};
use crate::notify::{messages, Notifier};
use crate::persistence::TradeLog;
use crate::signals::SignalSet;
use crate::Result;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Loop parameters taken from [`Settings`]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub poll_interval: Duration,
    pub bar_limit: usize,
    pub manual_rr: Option<f64>,
    pub asset_label: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

impl EngineConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval,
            bar_limit: settings.bar_limit,
            manual_rr: settings.manual_rr,
            asset_label: settings.asset_label.clone(),
        }
    }
}

/// What one completed cycle did
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub price: f64,
    pub decision: Decision,
    pub confidence: f64,
    pub opened: Option<Uuid>,
    pub closed: Option<ClosedPosition>,
}

/// Owns every mutable piece of the pipeline and publishes to [`SharedState`]
pub struct Engine {
    config: EngineConfig,
    market: Arc<dyn MarketData>,
    indicators: Arc<dyn IndicatorSource>,
    signals: SignalSet,
    decision: DecisionEngine,
    tracker: PositionTracker,
    notifier: Arc<dyn Notifier>,
    trade_log: Arc<dyn TradeLog>,
    shared: Arc<SharedState>,
    startup_sent: bool,
}

impl Engine {
    pub fn new(
        config: EngineConfig,
        market: Arc<dyn MarketData>,
        notifier: Arc<dyn Notifier>,
        trade_log: Arc<dyn TradeLog>,
    ) -> Self {
        let decision = DecisionEngine::default();
        let shared = Arc::new(SharedState::new(decision.weights().clone()));

        Self {
            config,
            market,
            indicators: Arc::new(StandardIndicators),
            signals: SignalSet::standard(),
            decision,
            tracker: PositionTracker::new(),
            notifier,
            trade_log,
            shared,
            startup_sent: false,
        }
    }

    pub fn with_indicators(mut self, indicators: Arc<dyn IndicatorSource>) -> Self {
        self.indicators = indicators;
        self
    }

    pub fn with_signals(mut self, signals: SignalSet) -> Self {
        self.signals = signals;
        self
    }

    /// Read handle for the API server
    pub fn shared(&self) -> Arc<SharedState> {
        self.shared.clone()
    }

    /// Run one full cycle
    ///
    /// Errors leave the published state, weights and position untouched.
    pub async fn run_cycle(&mut self) -> Result<CycleReport> {
        if !self.startup_sent {
            let spot = self.market.spot_price().await.ok();
            self.notify(&messages::startup(&self.config.asset_label, spot))
                .await;
            self.startup_sent = true;
        }

        let bars = self
            .market
            .recent_bars(self.config.bar_limit)
            .await
            .map_err(EngineError::DataFetch)?;
        let bars = normalize_bars(bars);

        let frame = self.indicators.compute(&bars)?;
        let row = *frame.last().ok_or_else(|| {
            EngineError::Computation(format!(
                "no complete indicator row from {} bars",
                bars.len()
            ))
        })?;

        let scores = self.signals.evaluate(&row);
        let price = row.close;
        let eval = self
            .decision
            .evaluate(&scores, price, row.atr_pct, self.config.manual_rr);

        tracing::debug!(
            "Cycle {} @ ${:.2}: conf {:.3} rr {:.2} atr {:.4}",
            eval.decision,
            price,
            eval.confidence,
            eval.plan.rr,
            row.atr_pct
        );

        self.shared.publish_state(EngineState {
            price: Some(price),
            updated_at: Some(Utc::now()),
            decision: Some(eval.decision),
            entry: Some(eval.plan.entry),
            sl: Some(eval.plan.stop_loss),
            tp: Some(eval.plan.take_profit),
            rr: Some(eval.plan.rr),
            confidence: eval.confidence,
            modules: scores.clone(),
        });

        let mut report = CycleReport {
            price,
            decision: eval.decision,
            confidence: eval.confidence,
            opened: None,
            closed: None,
        };

        // ====================================================================
        // Open
        // ====================================================================
        let buy_threshold = self.decision.config().buy_threshold;
        if eval.decision == Decision::Buy
            && eval.confidence >= buy_threshold
            && !self.tracker.has_open_position()
        {
            if eval.plan.is_degenerate() {
                tracing::debug!("Zero-volatility plan @ ${:.2}, exits at TP", price);
            }
            match self.tracker.open(eval.plan, eval.confidence, scores) {
                Ok(position) => {
                    let position = position.clone();
                    tracing::info!(
                        "🚀 Opened LONG @ ${:.2} (SL ${:.2}, TP ${:.2}, conf {:.0}%)",
                        position.entry,
                        position.stop_loss,
                        position.take_profit,
                        position.confidence * 100.0
                    );

                    if let Err(e) = self.trade_log.log_open(&position.to_record()).await {
                        tracing::warn!("{}", EngineError::TradeLog(e));
                    }
                    self.notify(&messages::position_opened(&self.config.asset_label, &position))
                        .await;

                    report.opened = Some(position.id);
                    self.shared.publish_position(Some(position));
                }
                Err(e) => tracing::warn!("Not opening position: {}", e),
            }
        }

        // ====================================================================
        // Close
        // ====================================================================
        if let Some(reason) = self.tracker.should_exit(price) {
            let closed = self
                .tracker
                .close(price, reason)
                .map_err(|e| EngineError::Computation(e.to_string()))?;

            self.decision.apply_feedback(
                &closed.position.modules,
                reason == ExitReason::TakeProfit,
                reason == ExitReason::StopLoss,
            )?;
            self.shared.publish_weights(self.decision.weights().clone());
            self.shared.publish_position(None);

            tracing::info!(
                "Closed position {} ({:?}) @ ${:.2}: {:+.2}%",
                closed.position.id,
                closed.reason,
                closed.exit_price,
                closed.realized_pct
            );
            self.notify(&messages::position_closed(&closed)).await;

            report.closed = Some(closed);
        }

        Ok(report)
    }

    /// Run cycles forever, sleeping the poll interval after each one
    ///
    /// Failed cycles are logged and skipped.
    pub async fn run(mut self) {
        tracing::info!(
            "⚙️  Engine loop started ({} via {}, every {:?})",
            self.config.asset_label,
            self.market.name(),
            self.config.poll_interval
        );

        loop {
            match self.run_cycle().await {
                Ok(report) => tracing::debug!(
                    "Cycle done: {} ({:.3})",
                    report.decision,
                    report.confidence
                ),
                Err(e) => tracing::warn!("⚠️  Cycle skipped: {}", e),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn notify(&self, message: &str) {
        if let Err(e) = self.notifier.send_text(message).await {
            tracing::warn!(
                "{} via {}",
                EngineError::Notification(e),
                self.notifier.name()
            );
        }
    }
}
