//! Cross-correlation with normalization and peak lag detection.
//!
//! ```text
//! R_xy(τ) = Σ_n x[n] · y[n + τ]
//! ```
//!
//! Used to measure stereo image: a mono signal duplicated to both channels
//! correlates at 1.0 at lag 0; Haas widening pulls that figure down.

/// Direct cross-correlation over lags `-max_lag..=max_lag`.
///
/// Entry `i` holds the correlation at lag `i - max_lag`.
pub fn xcorr_direct(x: &[f32], y: &[f32], max_lag: usize) -> Vec<f32> {
    (-(max_lag as i64)..=(max_lag as i64))
        .map(|lag| {
            x.iter()
                .enumerate()
                .filter_map(|(n, &xn)| {
                    let m = n as i64 + lag;
                    (m >= 0 && (m as usize) < y.len()).then(|| f64::from(xn) * f64::from(y[m as usize]))
                })
                .sum::<f64>() as f32
        })
        .collect()
}

/// Cross-correlation normalized by the signal energies, values in `[-1, 1]`.
///
/// Returns the raw correlation when either signal is silent.
pub fn xcorr_normalized(x: &[f32], y: &[f32], max_lag: usize) -> Vec<f32> {
    let raw = xcorr_direct(x, y, max_lag);
    let energy = |s: &[f32]| s.iter().map(|&v| f64::from(v) * f64::from(v)).sum::<f64>();
    let denom = (energy(x) * energy(y)).sqrt();

    if denom < 1e-12 {
        return raw;
    }
    raw.iter().map(|&r| (f64::from(r) / denom) as f32).collect()
}

/// Normalized correlation at lag 0.
pub fn zero_lag_correlation(x: &[f32], y: &[f32]) -> f32 {
    xcorr_normalized(x, y, 0).first().copied().unwrap_or(0.0)
}

/// Lag of maximum absolute correlation and its value.
///
/// Positive lag means `y[n] ≈ x[n - lag]`.
pub fn peak_lag(correlation: &[f32], max_lag: usize) -> (i32, f32) {
    correlation
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.abs().total_cmp(&b.abs()))
        .map(|(i, &v)| (i as i32 - max_lag as i32, v))
        .unwrap_or((0, 0.0))
}
