//! Z-normalisation with a defined zero-variance policy.

/// Standard deviations at or below this are treated as zero variance.
pub const ZERO_VARIANCE_STD: f64 = 1e-8;

/// Population mean and standard deviation (divides by n).
///
/// Returns `(0.0, 0.0)` for an empty slice.
#[must_use]
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.max(0.0).sqrt())
}

/// Z-normalise `values` to zero mean and unit variance.
///
/// A constant (zero-variance) input normalises to all zeros instead of NaN.
#[must_use = "returns the normalised copy; the input is unchanged"]
pub fn z_normalize(values: &[f64]) -> Vec<f64> {
    let (mean, std) = mean_std(values);
    if std <= ZERO_VARIANCE_STD {
        return vec![0.0; values.len()];
    }
    values.iter().map(|&x| (x - mean) / std).collect()
}
