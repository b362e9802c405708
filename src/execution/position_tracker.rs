use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

use crate::decision::Outcome;
use crate::models::{ModuleScores, Side, TradePlan, TradeRecord};

/// Closed positions kept in memory for inspection
const CLOSED_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    TakeProfit,
    StopLoss,
}

impl ExitReason {
    pub fn outcome(self) -> Outcome {
        match self {
            ExitReason::TakeProfit => Outcome::TakeProfit,
            ExitReason::StopLoss => Outcome::StopLoss,
        }
    }
}

/// The single hypothetical position being tracked
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OpenPosition {
    pub id: Uuid,
    pub side: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr: f64,
    pub confidence: f64,
    pub opened_at: DateTime<Utc>,
    /// Module scores at the moment of opening, replayed into feedback on close
    pub modules: ModuleScores,
}

impl OpenPosition {
    pub fn to_record(&self) -> TradeRecord {
        TradeRecord {
            id: self.id,
            timestamp: self.opened_at,
            side: self.side,
            entry: self.entry,
            stop_loss: self.stop_loss,
            take_profit: self.take_profit,
            rr: self.rr,
            confidence: self.confidence,
            modules: self.modules.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClosedPosition {
    pub position: OpenPosition,
    pub exit_price: f64,
    pub exit_time: DateTime<Utc>,
    pub reason: ExitReason,
    /// Realized move in percent of entry
    pub realized_pct: f64,
}

/// Tracks at most one open LONG position through to its exit
#[derive(Debug, Default)]
pub struct PositionTracker {
    open: Option<OpenPosition>,
    closed: VecDeque<ClosedPosition>,
}

impl PositionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_position(&self) -> Option<&OpenPosition> {
        self.open.as_ref()
    }

    pub fn has_open_position(&self) -> bool {
        self.open.is_some()
    }

    /// Recently closed positions, oldest first
    pub fn closed_positions(&self) -> impl Iterator<Item = &ClosedPosition> {
        self.closed.iter()
    }

    /// Open a LONG position from a plan
    ///
    /// A zero-volatility plan (sl = tp = entry) is accepted; it exits at
    /// take-profit on the next price check.
    pub fn open(
        &mut self,
        plan: TradePlan,
        confidence: f64,
        modules: ModuleScores,
    ) -> anyhow::Result<&OpenPosition> {
        if let Some(existing) = &self.open {
            anyhow::bail!("Already have open position {}", existing.id);
        }

        let position = OpenPosition {
            id: Uuid::new_v4(),
            side: Side::Long,
            entry: plan.entry,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            rr: plan.rr,
            confidence,
            opened_at: Utc::now(),
            modules,
        };

        Ok(&*self.open.insert(position))
    }

    /// Check if the open position should exit at `current_price`
    pub fn should_exit(&self, current_price: f64) -> Option<ExitReason> {
        let position = self.open.as_ref()?;

        if current_price >= position.take_profit {
            Some(ExitReason::TakeProfit)
        } else if current_price <= position.stop_loss {
            Some(ExitReason::StopLoss)
        } else {
            None
        }
    }

    /// Close the open position
    pub fn close(&mut self, exit_price: f64, reason: ExitReason) -> anyhow::Result<ClosedPosition> {
        let Some(position) = self.open.take() else {
            anyhow::bail!("No open position to close");
        };

        let realized_pct = (exit_price - position.entry) / position.entry * 100.0;
        let closed = ClosedPosition {
            position,
            exit_price,
            exit_time: Utc::now(),
            reason,
            realized_pct,
        };

        self.closed.push_back(closed.clone());
        while self.closed.len() > CLOSED_HISTORY {
            self.closed.pop_front();
        }

        Ok(closed)
    }
}
