use super::moving_average::ema_series;
use crate::error::EngineError;

pub const FAST_PERIOD: u8 = 12;
pub const SLOW_PERIOD: u8 = 26;
pub const SIGNAL_PERIOD: u8 = 9;

/// MACD line, signal line and histogram aligned with the input prices
#[derive(Debug, Clone, Default)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub hist: Vec<Option<f64>>,
}

/// Standard 12/26/9 MACD
pub fn macd_series(prices: &[f64]) -> Result<MacdSeries, EngineError> {
    let fast = ema_series(prices, FAST_PERIOD)?;
    let slow = ema_series(prices, SLOW_PERIOD)?;

    let macd: Vec<Option<f64>> = fast
        .iter()
        .zip(&slow)
        .map(|(f, s)| Some((*f)? - (*s)?))
        .collect();

    // Signal line only starts once the MACD line is defined
    let start = macd.iter().position(Option::is_some);
    let mut signal = vec![None; prices.len()];
    if let Some(start) = start {
        let defined: Vec<f64> = macd[start..].iter().flatten().copied().collect();
        for (offset, value) in ema_series(&defined, SIGNAL_PERIOD)?.into_iter().enumerate() {
            signal[start + offset] = value;
        }
    }

    let hist = macd
        .iter()
        .zip(&signal)
        .map(|(m, s)| Some((*m)? - (*s)?))
        .collect();

    Ok(MacdSeries { macd, signal, hist })
}
