use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// One bar of market history as delivered by a market data provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub volume: f64,
}

/// Fixed set of scoring modules feeding the decision engine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Rsi,
    Macd,
    Volume,
    WhaleActivity,
    MarketState,
    Sentiment,
    Regime,
    Atr,
    Mlp, // reserved for a learned model
    Drl, // reserved for a learned model
}

impl Module {
    pub const ALL: [Module; 10] = [
        Module::Rsi,
        Module::Macd,
        Module::Volume,
        Module::WhaleActivity,
        Module::MarketState,
        Module::Sentiment,
        Module::Regime,
        Module::Atr,
        Module::Mlp,
        Module::Drl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Module::Rsi => "rsi",
            Module::Macd => "macd",
            Module::Volume => "volume",
            Module::WhaleActivity => "whale_activity",
            Module::MarketState => "market_state",
            Module::Sentiment => "sentiment",
            Module::Regime => "regime",
            Module::Atr => "atr",
            Module::Mlp => "mlp",
            Module::Drl => "drl",
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clamp a module score into [-1, 1]; non-finite values read as neutral
pub fn clamp_unit(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Per-module scores produced by one engine cycle
///
/// Every stored value is already clamped to [-1, 1].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ModuleScores(BTreeMap<Module, f64>);

impl ModuleScores {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, module: Module, score: f64) {
        self.0.insert(module, clamp_unit(score));
    }

    /// Score for a module, 0.0 when the module did not report
    pub fn get(&self, module: Module) -> f64 {
        self.0.get(&module).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, f64)> + '_ {
        self.0.iter().map(|(m, s)| (*m, *s))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Module, f64)> for ModuleScores {
    fn from_iter<I: IntoIterator<Item = (Module, f64)>>(iter: I) -> Self {
        let mut scores = ModuleScores::new();
        for (module, score) in iter {
            scores.set(module, score);
        }
        scores
    }
}

/// Discrete trading recommendation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Buy => f.write_str("BUY"),
            Decision::Sell => f.write_str("SELL"),
            Decision::Hold => f.write_str("HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => f.write_str("LONG"),
        }
    }
}

/// Entry with its protective exits
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TradePlan {
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr: f64,
}

impl TradePlan {
    /// True when the exits collapse onto the entry (no observed volatility)
    pub fn is_degenerate(&self) -> bool {
        !(self.stop_loss < self.entry && self.take_profit > self.entry)
    }
}

/// Snapshot of the most recently completed engine cycle
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineState {
    pub price: Option<f64>,
    pub updated_at: Option<DateTime<Utc>>,
    pub decision: Option<Decision>,
    pub entry: Option<f64>,
    pub sl: Option<f64>,
    pub tp: Option<f64>,
    pub rr: Option<f64>,
    pub confidence: f64,
    pub modules: ModuleScores,
}

/// Append-only record of an opened hypothetical trade
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub side: Side,
    pub entry: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub rr: f64,
    pub confidence: f64,
    pub modules: ModuleScores,
}
