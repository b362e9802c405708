use crate::error::EngineError;
use yata::core::Method;
use yata::methods::{EMA, RMA};

/// Exponential moving average series aligned with `values`
///
/// Seeded with the first value (no SMA warmup) and reported as `None` until
/// `period` values have been seen.
pub fn ema_series(values: &[f64], period: u8) -> Result<Vec<Option<f64>>, EngineError> {
    let Some(first) = values.first() else {
        return Ok(Vec::new());
    };

    let mut ema = EMA::new(period, first)
        .map_err(|e| EngineError::Computation(format!("EMA({}): {:?}", period, e)))?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let value = ema.next(v);
            (i + 1 >= period as usize).then_some(value)
        })
        .collect())
}

/// Wilder (running) moving average series, same warmup rule as [`ema_series`]
pub fn wilder_series(values: &[f64], period: u8) -> Result<Vec<Option<f64>>, EngineError> {
    let Some(first) = values.first() else {
        return Ok(Vec::new());
    };

    let mut rma = RMA::new(period, first)
        .map_err(|e| EngineError::Computation(format!("RMA({}): {:?}", period, e)))?;

    Ok(values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let value = rma.next(v);
            (i + 1 >= period as usize).then_some(value)
        })
        .collect())
}

/// Simple rolling mean over a trailing window
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Each window is summed on its own so a NaN only spoils the windows holding it
    (0..values.len())
        .map(|i| {
            (i + 1 >= window)
                .then(|| values[i + 1 - window..=i].iter().sum::<f64>() / window as f64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_mean() {
        let values = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        let sma = rolling_mean(&values, 5);
        assert_eq!(sma[..4], [None, None, None, None]);
        assert_eq!(sma[4], Some(104.0));

        let sma3 = rolling_mean(&values, 3);
        assert_eq!(sma3[2], Some(102.0));
        assert_eq!(sma3[4], Some(106.0));
    }

    #[test]
    fn test_ema_warmup() {
        let values: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let ema = ema_series(&values, 20).unwrap();

        assert_eq!(ema.len(), 30);
        assert!(ema[18].is_none());
        assert!(ema[19].is_some());
    }

    #[test]
    fn test_ema_lags_rising_prices() {
        let values: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let ema = ema_series(&values, 20).unwrap();

        let last = ema[59].unwrap();
        assert!(last < 159.0);
        assert!(last > 130.0);
    }

    #[test]
    fn test_constant_series_is_flat() {
        let values = vec![50.0; 40];
        for value in ema_series(&values, 14).unwrap().into_iter().flatten() {
            assert!((value - 50.0).abs() < 1e-9);
        }
        for value in wilder_series(&values, 14).unwrap().into_iter().flatten() {
            assert!((value - 50.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(ema_series(&[], 20).unwrap().is_empty());
        assert!(rolling_mean(&[], 3).is_empty());
    }
}
