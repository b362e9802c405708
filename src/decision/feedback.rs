use super::engine::DecisionEngine;
use crate::error::EngineError;
use crate::models::ModuleScores;

/// How a tracked position ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    TakeProfit,
    StopLoss,
}

impl Outcome {
    /// Exactly one flag must be set
    pub fn from_flags(hit_take_profit: bool, hit_stop_loss: bool) -> Result<Self, EngineError> {
        match (hit_take_profit, hit_stop_loss) {
            (true, false) => Ok(Outcome::TakeProfit),
            (false, true) => Ok(Outcome::StopLoss),
            _ => Err(EngineError::InvalidOutcome {
                hit_take_profit,
                hit_stop_loss,
            }),
        }
    }

    /// +1 when price moved up into the take-profit, -1 into the stop
    fn direction(self) -> f64 {
        match self {
            Outcome::TakeProfit => 1.0,
            Outcome::StopLoss => -1.0,
        }
    }
}

impl DecisionEngine {
    /// Nudge weights toward modules that called the realized direction
    ///
    /// A module whose open-time score agrees in sign with the outcome gains
    /// `learning_rate`; one that disagrees loses it. Neutral scores are left
    /// alone. Invalid flag combinations leave the weights untouched.
    pub fn apply_feedback(
        &mut self,
        scores_at_open: &ModuleScores,
        hit_take_profit: bool,
        hit_stop_loss: bool,
    ) -> Result<Outcome, EngineError> {
        let outcome = Outcome::from_flags(hit_take_profit, hit_stop_loss)?;
        self.apply_outcome(scores_at_open, outcome);
        Ok(outcome)
    }

    pub fn apply_outcome(&mut self, scores_at_open: &ModuleScores, outcome: Outcome) {
        let config = *self.config();
        let direction = outcome.direction();

        for (module, score) in scores_at_open.iter() {
            if score == 0.0 || !score.is_finite() {
                continue;
            }

            let step = if score.signum() == direction {
                config.learning_rate
            } else {
                -config.learning_rate
            };

            let current = self.weights().get(module);
            let updated = (current + step).clamp(config.min_weight, config.max_weight);
            self.weights_mut().set(module, updated);

            tracing::debug!("Weight {} {:.3} -> {:.3}", module, current, updated);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Module;

    fn scores(pairs: &[(Module, f64)]) -> ModuleScores {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_agreeing_module_gains_on_take_profit() {
        let mut engine = DecisionEngine::default();
        let outcome = engine
            .apply_feedback(&scores(&[(Module::Rsi, 0.8)]), true, false)
            .unwrap();

        assert_eq!(outcome, Outcome::TakeProfit);
        assert!((engine.weights().get(Module::Rsi) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_bullish_module_loses_on_stop_loss() {
        let mut engine = DecisionEngine::default();
        engine
            .apply_feedback(&scores(&[(Module::Rsi, 0.8), (Module::Macd, -0.4)]), false, true)
            .unwrap();

        assert!((engine.weights().get(Module::Rsi) - 0.95).abs() < 1e-12);
        // bearish module called the stop correctly
        assert!((engine.weights().get(Module::Macd) - 1.05).abs() < 1e-12);
    }

    #[test]
    fn test_neutral_scores_untouched() {
        let mut engine = DecisionEngine::default();
        engine
            .apply_feedback(&scores(&[(Module::Sentiment, 0.0)]), true, false)
            .unwrap();

        assert_eq!(engine.weights().get(Module::Sentiment), 1.0);
        assert_eq!(engine.weights().get(Module::Drl), 1.0);
    }

    #[test]
    fn test_weights_stay_in_bounds() {
        let mut engine = DecisionEngine::default();
        let s = scores(&[(Module::Rsi, 0.9), (Module::Volume, -0.9)]);

        for _ in 0..100 {
            engine.apply_feedback(&s, true, false).unwrap();
        }

        assert_eq!(engine.weights().get(Module::Rsi), 2.0);
        assert_eq!(engine.weights().get(Module::Volume), 0.0);
    }

    #[test]
    fn test_invalid_outcome_rejected() {
        let mut engine = DecisionEngine::default();
        let before = engine.weights().clone();
        let s = scores(&[(Module::Rsi, 0.8)]);

        let both = engine.apply_feedback(&s, true, true);
        assert!(matches!(
            both,
            Err(EngineError::InvalidOutcome {
                hit_take_profit: true,
                hit_stop_loss: true
            })
        ));
        assert!(engine.apply_feedback(&s, false, false).is_err());
        assert_eq!(engine.weights(), &before);
    }

    #[test]
    fn test_learning_shifts_confidence() {
        let mut engine = DecisionEngine::default();
        let s = scores(&[(Module::Rsi, 0.8), (Module::Macd, 0.6)]);

        let before = engine.score(&s);
        engine.apply_feedback(&s, true, false).unwrap();
        assert!(engine.score(&s) > before);
    }
}
