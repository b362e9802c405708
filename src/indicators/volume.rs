/// Rolling volume z-score
///
/// `(volume - mean) / stddev` over the trailing `window` bars (sample
/// standard deviation). A window with no dispersion scores 0.
pub fn volume_zscore_series(volumes: &[f64], window: usize) -> Vec<Option<f64>> {
    if window < 2 {
        return vec![None; volumes.len()];
    }

    (0..volumes.len())
        .map(|i| {
            if i + 1 < window {
                return None;
            }

            let slice = &volumes[i + 1 - window..=i];
            let mean = slice.iter().sum::<f64>() / window as f64;
            let variance =
                slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            let std = variance.sqrt();

            if std > 0.0 && std.is_finite() {
                Some((volumes[i] - mean) / std)
            } else {
                Some(0.0)
            }
        })
        .collect()
}
