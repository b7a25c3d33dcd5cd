//! Order statistics and robust standardization.
//!
//! Vulnerability feature columns are heavy-tailed: a handful of records with
//! extreme exploit probability would compress everything else under a
//! mean/stddev z-score. Median and MAD are insensitive to those tails, and
//! the symmetric cap bounds any one feature's pull on the weighted sum.

/// Consistency constant making MAD comparable to a standard deviation.
pub const MAD_SCALE: f64 = 1.4826;

/// Substituted for a zero MAD so a constant column standardizes to zeros.
pub const MAD_EPSILON: f64 = 1e-9;

/// Default symmetric cap on robust z-scores.
pub const DEFAULT_Z_CAP: f64 = 3.0;

/// Round to a fixed number of decimal digits.
pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Sort ascending using IEEE total ordering.
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut xs = values.to_vec();
    xs.sort_by(f64::total_cmp);
    xs
}

/// Empirical percentile with linear interpolation between order statistics.
///
/// `q` is a fraction in [0, 1] and is clamped into it. An empty input yields
/// `0.0`.
pub fn percentile(values: &[f64], q: f64) -> f64 {
    percentile_of_sorted(&sorted(values), q)
}

/// [`percentile`] over input that is already sorted ascending.
pub fn percentile_of_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let idx = q * (sorted.len() - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = idx.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = idx - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Median; the mean of the two middle values for even lengths.
pub fn median(values: &[f64]) -> f64 {
    let xs = sorted(values);
    let n = xs.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => xs[n / 2],
        _ => 0.5 * (xs[n / 2 - 1] + xs[n / 2]),
    }
}

/// Median absolute deviation from `center`, never exactly zero.
pub fn median_absolute_deviation(values: &[f64], center: f64) -> f64 {
    let deviations: Vec<f64> = values.iter().map(|v| (v - center).abs()).collect();
    let mad = percentile(&deviations, 0.5);
    if mad > 0.0 {
        mad
    } else {
        MAD_EPSILON
    }
}

/// Robust z-score of every value in a column, capped to `[-cap, cap]`.
///
/// Output is aligned with the input order.
pub fn robust_z_scores(values: &[f64], cap: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let center = median(values);
    let scale = MAD_SCALE * median_absolute_deviation(values, center);
    values
        .iter()
        .map(|v| ((v - center) / scale).clamp(-cap, cap))
        .collect()
}
