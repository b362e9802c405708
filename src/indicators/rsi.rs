//! Relative Strength Index (RSI)
//!
//! RSI measures the magnitude of recent price changes to evaluate
//! overbought or oversold conditions.
//!
//! Values:
//! - RSI > 70: Overbought
//! - RSI < 30: Oversold
//!
//! Gains and losses are smoothed with Wilder's average.

use super::moving_average::wilder_series;
use crate::error::EngineError;

/// RSI series aligned with `prices`; the first `period` entries are `None`
pub fn rsi_series(prices: &[f64], period: u8) -> Result<Vec<Option<f64>>, EngineError> {
    if prices.len() < 2 {
        return Ok(vec![None; prices.len()]);
    }

    let mut gains = Vec::with_capacity(prices.len() - 1);
    let mut losses = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let avg_gain = wilder_series(&gains, period)?;
    let avg_loss = wilder_series(&losses, period)?;

    let mut out = Vec::with_capacity(prices.len());
    out.push(None); // no change for the first bar
    for (gain, loss) in avg_gain.into_iter().zip(avg_loss) {
        out.push(match (gain, loss) {
            (Some(g), Some(l)) => Some(rsi_from_averages(g, l)),
            _ => None,
        });
    }
    Ok(out)
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss <= 0.0 {
        // Flat series reads neutral, pure gains read fully overbought
        return if avg_gain <= 0.0 { 50.0 } else { 100.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}
