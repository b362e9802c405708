use super::ModuleScorer;
use crate::indicators::IndicatorRow;
use crate::models::Module;

/// Rescales RSI around 50: 0 → -1, 100 → +1
#[derive(Debug, Clone, Copy, Default)]
pub struct RsiScorer;

impl ModuleScorer for RsiScorer {
    fn module(&self) -> Module {
        Module::Rsi
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        (row.rsi - 50.0) / 50.0
    }
}

/// MACD line minus signal, normalized by 0.1% of price
#[derive(Debug, Clone, Copy, Default)]
pub struct MacdScorer;

impl ModuleScorer for MacdScorer {
    fn module(&self) -> Module {
        Module::Macd
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        let delta = row.macd - row.macd_signal;
        delta / (row.close * 0.001 + 1e-9)
    }
}

/// Volume z-score scaled so 3 sigma saturates
#[derive(Debug, Clone, Copy, Default)]
pub struct VolumeScorer;

impl ModuleScorer for VolumeScorer {
    fn module(&self) -> Module {
        Module::Volume
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        row.vol_z / 3.0
    }
}

/// Low volatility is favourable: 2% ATR is neutral, 0% is +1, 4%+ is -1
#[derive(Debug, Clone, Copy, Default)]
pub struct AtrScorer;

pub const ATR_NEUTRAL_PCT: f64 = 0.02;

impl ModuleScorer for AtrScorer {
    fn module(&self) -> Module {
        Module::Atr
    }

    fn score(&self, row: &IndicatorRow) -> f64 {
        (ATR_NEUTRAL_PCT - row.atr_pct) / ATR_NEUTRAL_PCT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::neutral_row;

    #[test]
    fn test_rsi_scaling() {
        let mut row = neutral_row();
        row.rsi = 75.0;
        assert!((RsiScorer.score(&row) - 0.5).abs() < 1e-12);
        row.rsi = 25.0;
        assert!((RsiScorer.score(&row) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_macd_normalized_by_price() {
        let mut row = neutral_row();
        row.close = 60_000.0;
        row.macd = 30.0;
        row.macd_signal = 0.0;

        // 30 / (60000 * 0.001) = 0.5
        assert!((MacdScorer.score(&row) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_volume_scaling() {
        let mut row = neutral_row();
        row.vol_z = -1.5;
        assert!((VolumeScorer.score(&row) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_atr_scoring() {
        let mut row = neutral_row();
        row.atr_pct = 0.0;
        assert_eq!(AtrScorer.score(&row), 1.0);
        row.atr_pct = 0.02;
        assert_eq!(AtrScorer.score(&row), 0.0);
        row.atr_pct = 0.03;
        assert!(AtrScorer.score(&row) < 0.0);
    }
}
