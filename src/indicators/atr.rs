//! Average True Range as a fraction of price
//!
//! True Range is the greatest of:
//! - Current High - Current Low
//! - Abs(Current High - Previous Close)
//! - Abs(Current Low - Previous Close)
//!
//! The first bar has no previous close, so its range is High - Low.
//! The average is a plain rolling mean, then divided by close and floored at 0.

use super::moving_average::rolling_mean;
use crate::models::PriceBar;

/// True range per bar
pub fn true_ranges(bars: &[PriceBar]) -> Vec<f64> {
    let mut out = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        let high = bars[i].high;
        let low = bars[i].low;
        let mut tr = (high - low).abs();

        if i > 0 {
            let prev_close = bars[i - 1].close;
            tr = tr
                .max((high - prev_close).abs())
                .max((low - prev_close).abs());
        }

        out.push(tr);
    }

    out
}

/// Rolling mean true range over `period` bars divided by close
pub fn atr_pct_series(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_ranges(bars), period)
        .into_iter()
        .zip(bars)
        .map(|(atr, bar)| {
            let atr = atr?;
            if bar.close <= 0.0 {
                return None;
            }
            Some((atr / bar.close).max(0.0))
        })
        .collect()
}
