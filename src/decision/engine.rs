use crate::models::{clamp_unit, Decision, Module, ModuleScores, TradePlan};
use serde::Serialize;
use std::collections::BTreeMap;

/// Tunables for aggregation, labelling, sizing of exits and learning
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionConfig {
    pub buy_threshold: f64,
    pub sell_threshold: f64,
    /// Risk/reward used when volatility is unusable
    pub default_rr: f64,
    pub min_rr: f64,
    pub max_rr: f64,
    /// Stop distance in multiples of price * volatility
    pub stop_multiplier: f64,
    pub learning_rate: f64,
    pub min_weight: f64,
    pub max_weight: f64,
    pub initial_weight: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            buy_threshold: 0.7,
            sell_threshold: 0.3,
            default_rr: 2.0,
            min_rr: 1.0,
            max_rr: 5.0,
            stop_multiplier: 1.5,
            learning_rate: 0.05,
            min_weight: 0.0,
            max_weight: 2.0,
            initial_weight: 1.0,
        }
    }
}

/// Per-module weights; every module always has an entry
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(transparent)]
pub struct Weights(BTreeMap<Module, f64>);

impl Weights {
    pub fn uniform(weight: f64) -> Self {
        Self(Module::ALL.iter().map(|m| (*m, weight)).collect())
    }

    pub fn get(&self, module: Module) -> f64 {
        self.0.get(&module).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Module, f64)> + '_ {
        self.0.iter().map(|(m, w)| (*m, *w))
    }

    pub(crate) fn set(&mut self, module: Module, weight: f64) {
        self.0.insert(module, weight);
    }
}

/// Confidence, label and plan computed for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub confidence: f64,
    pub decision: Decision,
    pub plan: TradePlan,
}

/// Holds the module weights and turns module scores into decisions
///
/// Only [`DecisionEngine::apply_feedback`] mutates the weights.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    config: DecisionConfig,
    weights: Weights,
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::new(DecisionConfig::default())
    }
}

/// Classify a confidence with the standard thresholds (0.7 / 0.3)
pub fn label_from_conf(confidence: f64) -> Decision {
    DecisionConfig::default().label(confidence)
}

impl DecisionConfig {
    pub fn label(&self, confidence: f64) -> Decision {
        if confidence >= self.buy_threshold {
            Decision::Buy
        } else if confidence <= self.sell_threshold {
            Decision::Sell
        } else {
            Decision::Hold
        }
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl DecisionEngine {
    pub fn new(config: DecisionConfig) -> Self {
        Self {
            weights: Weights::uniform(config.initial_weight),
            config,
        }
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    /// Aggregate module scores into a confidence in [0, 1]
    ///
    /// Scores are clamped to [-1, 1] (non-finite reads as 0), weighted and
    /// summed, then squashed by the logistic function.
    pub fn score(&self, scores: &ModuleScores) -> f64 {
        let total: f64 = scores
            .iter()
            .map(|(module, score)| {
                let weight = self.weights.get(module);
                debug_assert!(
                    weight >= self.config.min_weight && weight <= self.config.max_weight,
                    "weight for {} out of bounds: {}",
                    module,
                    weight
                );
                weight * clamp_unit(score)
            })
            .sum();

        let confidence = logistic(total);
        if confidence.is_finite() {
            confidence
        } else {
            0.5
        }
    }

    pub fn label_from_conf(&self, confidence: f64) -> Decision {
        self.config.label(confidence)
    }

    /// Risk/reward ratio from fractional volatility, bounded to [min_rr, max_rr]
    ///
    /// 0% volatility gives 1.0 and every additional 1% adds 1.0.
    pub fn auto_rr(&self, volatility_ratio: f64) -> f64 {
        if !volatility_ratio.is_finite() || volatility_ratio < 0.0 {
            return self.config.default_rr;
        }
        (1.0 + volatility_ratio * 100.0).clamp(self.config.min_rr, self.config.max_rr)
    }

    /// Long-side stop-loss / take-profit around `price`
    ///
    /// Zero volatility yields a degenerate plan with both exits at `price`.
    pub fn trade_plan(&self, price: f64, rr: f64, volatility_ratio: f64) -> TradePlan {
        let vol = if volatility_ratio.is_finite() {
            volatility_ratio.max(0.0)
        } else {
            0.0
        };
        let rr = if rr.is_finite() && rr > 0.0 {
            rr
        } else {
            self.config.default_rr
        };

        let stop_distance = price * vol * self.config.stop_multiplier;
        TradePlan {
            entry: price,
            stop_loss: price - stop_distance,
            take_profit: price + stop_distance * rr,
            rr,
        }
    }

    /// Full per-cycle evaluation
    ///
    /// `manual_rr` overrides the volatility-derived ratio when set.
    pub fn evaluate(
        &self,
        scores: &ModuleScores,
        price: f64,
        volatility_ratio: f64,
        manual_rr: Option<f64>,
    ) -> Evaluation {
        let confidence = self.score(scores);
        let rr = manual_rr.unwrap_or_else(|| self.auto_rr(volatility_ratio));

        Evaluation {
            confidence,
            decision: self.label_from_conf(confidence),
            plan: self.trade_plan(price, rr, volatility_ratio),
        }
    }
}
