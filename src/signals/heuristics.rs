use super::ModuleScorer;
use crate::indicators::IndicatorRow;
use crate::models::{clamp_unit, Module};

/// Volume z-score above which activity is attributed to large players
pub const WHALE_Z_THRESHOLD: f64 = 2.0;

/// Unusual volume bursts; silent below the threshold, never negative
#[derive(Debug, Clone, Copy, Default)]
pub struct WhaleScorer;

impl ModuleScorer for WhaleScorer {
    fn module(&self) -> Module {
        Module::WhaleActivity
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        if row.vol_z <= WHALE_Z_THRESHOLD {
            return 0.0;
        }
        ((row.vol_z - WHALE_Z_THRESHOLD) / 3.0).clamp(0.0, 1.0)
    }
}

/// Trend state from the EMA20/EMA50 spread, 1% spread saturates
#[derive(Debug, Clone, Copy, Default)]
pub struct MarketStateScorer;

impl ModuleScorer for MarketStateScorer {
    fn module(&self) -> Module {
        Module::MarketState
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        if row.ema50 <= 0.0 {
            return 0.0;
        }
        clamp_unit((row.ema20 - row.ema50) / row.ema50 * 100.0)
    }
}

/// No sentiment feed is wired in; always neutral
#[derive(Debug, Clone, Copy, Default)]
pub struct SentimentScorer;

impl ModuleScorer for SentimentScorer {
    fn module(&self) -> Module {
        Module::Sentiment
    }

    fn score(&self, _row: &IndicatorRow) -> f64 {
        0.0
    }
}

/// Momentum regime: histogram and RSI agreeing on direction
#[derive(Debug, Clone, Copy, Default)]
pub struct RegimeScorer;

impl ModuleScorer for RegimeScorer {
    fn module(&self) -> Module {
        Module::Regime
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        if row.macd_hist > 0.0 && row.rsi > 50.0 {
            0.5
        } else if row.macd_hist < 0.0 && row.rsi < 50.0 {
            -0.5
        } else {
            0.0
        }
    }
}

/// Slot reserved for a learned model; scores 0.0 until one exists
#[derive(Debug, Clone, Copy)]
pub struct Placeholder(pub Module);

impl ModuleScorer for Placeholder {
    fn module(&self) -> Module {
        self.0
    }

    fn score(&self, _row: &IndicatorRow) -> f64 {
        0.0
    }
}
