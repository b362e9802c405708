// Technical indicators module
// EMA, MACD, RSI, ATR% and volume z-score over a bar history

pub mod atr;
pub mod macd;
pub mod moving_average;
pub mod rsi;
pub mod volume;

pub use atr::{atr_pct_series, true_ranges};
pub use macd::{macd_series, MacdSeries};
pub use moving_average::{ema_series, rolling_mean, wilder_series};
pub use rsi::rsi_series;
pub use volume::volume_zscore_series;

use crate::error::EngineError;
use crate::models::PriceBar;
use chrono::{DateTime, Utc};
use serde::Serialize;

pub const EMA_FAST: u8 = 20;
pub const EMA_SLOW: u8 = 50;
pub const RSI_PERIOD: u8 = 14;
pub const ATR_PERIOD: usize = 14;
pub const VOLUME_WINDOW: usize = 20;

/// One fully-defined indicator row aligned with a bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IndicatorRow {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub ema20: f64,
    pub ema50: f64,
    pub macd: f64,
    pub macd_signal: f64,
    pub macd_hist: f64,
    pub rsi: f64,
    pub atr_pct: f64,
    pub vol_z: f64,
    pub volume: f64,
}

/// Indicator rows in bar order; incomplete rows are never stored
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    rows: Vec<IndicatorRow>,
}

impl IndicatorFrame {
    /// Frame from rows already known to be complete, oldest first
    pub fn from_rows(rows: Vec<IndicatorRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[IndicatorRow] {
        &self.rows
    }

    pub fn last(&self) -> Option<&IndicatorRow> {
        self.rows.last()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Turns bar history into indicator rows
pub trait IndicatorSource: Send + Sync {
    fn compute(&self, bars: &[PriceBar]) -> Result<IndicatorFrame, EngineError>;
}

/// The standard EMA20/50, MACD(12,26,9), RSI14, ATR14%, vol-z20 set
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardIndicators;

impl IndicatorSource for StandardIndicators {
    fn compute(&self, bars: &[PriceBar]) -> Result<IndicatorFrame, EngineError> {
        compute_indicators(bars)
    }
}

/// Compute the full indicator frame for `bars` (oldest first)
///
/// Rows are emitted only where every indicator is defined, so the first
/// complete row appears once the slowest EMA has warmed up.
pub fn compute_indicators(bars: &[PriceBar]) -> Result<IndicatorFrame, EngineError> {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let volumes: Vec<f64> = bars
        .iter()
        .map(|b| if b.volume.is_finite() { b.volume } else { 0.0 })
        .collect();

    let ema20 = ema_series(&closes, EMA_FAST)?;
    let ema50 = ema_series(&closes, EMA_SLOW)?;
    let macd = macd_series(&closes)?;
    let rsi = rsi_series(&closes, RSI_PERIOD)?;
    let atr_pct = atr_pct_series(bars, ATR_PERIOD);
    let vol_z = volume_zscore_series(&volumes, VOLUME_WINDOW);

    // NaN inputs (e.g. a kline high of "NaN") count as undefined
    let defined = |v: Option<f64>| v.filter(|x| x.is_finite());

    let rows = (0..bars.len())
        .filter_map(|i| {
            Some(IndicatorRow {
                timestamp: bars[i].timestamp,
                close: defined(Some(closes[i]))?,
                ema20: defined(ema20[i])?,
                ema50: defined(ema50[i])?,
                macd: defined(macd.macd[i])?,
                macd_signal: defined(macd.signal[i])?,
                macd_hist: defined(macd.hist[i])?,
                rsi: defined(rsi[i])?,
                atr_pct: defined(atr_pct[i])?,
                vol_z: defined(vol_z[i])?,
                volume: volumes[i],
            })
        })
        .collect();

    Ok(IndicatorFrame { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn bars(n: usize) -> Vec<PriceBar> {
        let start = Utc::now() - Duration::minutes(n as i64);
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 / 7.0).sin() * 2.0 + i as f64 * 0.05;
                PriceBar {
                    timestamp: start + Duration::minutes(i as i64),
                    close,
                    high: close * 1.002,
                    low: close * 0.998,
                    volume: 10.0 + (i % 5) as f64,
                }
            })
            .collect()
    }

    #[test]
    fn test_first_complete_row_after_slow_ema() {
        let frame = compute_indicators(&bars(60)).unwrap();
        // EMA50 is the slowest warmup: rows 49..60
        assert_eq!(frame.len(), 11);
    }

    #[test]
    fn test_short_history_yields_empty_frame() {
        let frame = compute_indicators(&bars(30)).unwrap();
        assert!(frame.is_empty());
        assert!(frame.last().is_none());
    }

    #[test]
    fn test_rows_are_complete_and_sane() {
        let input = bars(240);
        let frame = compute_indicators(&input).unwrap();
        let last = frame.last().unwrap();

        assert_eq!(last.timestamp, input[239].timestamp);
        assert_eq!(last.close, input[239].close);
        assert!(last.rsi >= 0.0 && last.rsi <= 100.0);
        assert!(last.atr_pct >= 0.0);
        assert!(frame.rows().iter().all(|r| r.ema20.is_finite() && r.vol_z.is_finite()));
    }

    #[test]
    fn test_missing_volume_reads_zero() {
        let mut input = bars(80);
        input[79].volume = f64::NAN;

        let frame = compute_indicators(&input).unwrap();
        assert_eq!(frame.last().unwrap().volume, 0.0);
    }

    #[test]
    fn test_non_finite_range_rows_dropped() {
        let mut input = bars(100);
        input[70].high = f64::NAN;
        input[70].low = f64::NAN;

        let frame = compute_indicators(&input).unwrap();
        assert!(frame.rows().iter().all(|r| r.atr_pct.is_finite()));

        // every ATR window holding bar 70 is undefined: rows 70..84
        let dropped = input[70].timestamp..input[84].timestamp;
        assert!(frame.rows().iter().all(|r| !dropped.contains(&r.timestamp)));
        assert_eq!(frame.len(), 51 - 14);
        assert_eq!(frame.last().unwrap().timestamp, input[99].timestamp);
    }

    #[test]
    fn test_standard_indicator_source() {
        let frame = StandardIndicators.compute(&bars(100)).unwrap();
        assert_eq!(frame.len(), 51);
    }
}
