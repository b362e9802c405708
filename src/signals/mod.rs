// Signal modules
// Each module turns the latest indicator row into a score in [-1, 1]
pub mod heuristics;
pub mod technical;

pub use heuristics::{MarketStateScorer, Placeholder, RegimeScorer, SentimentScorer, WhaleScorer};
pub use technical::{AtrScorer, MacdScorer, RsiScorer, VolumeScorer};

use crate::indicators::IndicatorRow;
use crate::models::{Module, ModuleScores};

/// Base trait for all scoring modules
pub trait ModuleScorer: Send + Sync {
    /// Which module slot this scorer fills
    fn module(&self) -> Module;

    /// Raw score for the row; callers clamp to [-1, 1]
    fn score(&self, row: &IndicatorRow) -> f64;
}

/// The configured collection of scorers, evaluated together each cycle
pub struct SignalSet {
    scorers: Vec<Box<dyn ModuleScorer>>,
}

impl SignalSet {
    pub fn new(scorers: Vec<Box<dyn ModuleScorer>>) -> Self {
        Self { scorers }
    }

    /// One scorer per module, including the neutral placeholders
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(RsiScorer),
            Box::new(MacdScorer),
            Box::new(VolumeScorer),
            Box::new(WhaleScorer),
            Box::new(MarketStateScorer),
            Box::new(SentimentScorer),
            Box::new(RegimeScorer),
            Box::new(AtrScorer),
            Box::new(Placeholder(Module::Mlp)),
            Box::new(Placeholder(Module::Drl)),
        ])
    }

    pub fn len(&self) -> usize {
        self.scorers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scorers.is_empty()
    }

    /// Score every module against the row
    pub fn evaluate(&self, row: &IndicatorRow) -> ModuleScores {
        self.scorers
            .iter()
            .map(|scorer| (scorer.module(), scorer.score(row)))
            .collect()
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::standard()
    }
}
