//! Sliding-window subsequence distances used to score shapelets.
//!
//! A [`SubsequenceDistance`] knows how to turn a raw window into shapelet
//! content and how much it costs to lay that content over a window of a
//! series. [`min_distance`] slides the content along every offset of a
//! (possibly multi-channel) series and keeps the cheapest alignment, giving
//! up as soon as no offset can beat the caller's limit.

use std::fmt;

use crate::msm::Msm;
use crate::normalize::{ZERO_VARIANCE_STD, mean_std, z_normalize};

/// A distance between a prepared candidate and equally long windows of a series.
///
/// Costs are additive across channels. [`finalize`][Self::finalize] maps a
/// total cost to the reported distance and [`cost_limit`][Self::cost_limit]
/// is its inverse, used to translate a distance limit into cost space.
pub trait SubsequenceDistance: Send + Sync + fmt::Debug {
    /// Registry name of this distance.
    fn name(&self) -> &'static str;

    /// Name plus every parameter that changes the distances it reports.
    fn descriptor(&self) -> String {
        self.name().to_string()
    }

    /// Convert a raw window into candidate content.
    fn prepare(&self, window: &[f64]) -> Vec<f64>;

    /// Cost of aligning `candidate` with the raw `window` (same length).
    ///
    /// Returns `f64::INFINITY` once the running cost exceeds `limit`.
    fn window_cost(&self, candidate: &[f64], window: &[f64], limit: f64) -> f64;

    /// Map a total cost over `length` samples to a distance.
    fn finalize(&self, cost: f64, length: usize) -> f64;

    /// Map a distance limit to the equivalent cost limit.
    fn cost_limit(&self, distance: f64, length: usize) -> f64;
}

/// Squared Euclidean cost on raw values, reported as mean squared error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

/// Squared Euclidean cost after z-normalising both candidate and window.
///
/// Constant windows normalise to zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZNormEuclidean;

/// MSM cost between the raw candidate and each raw window.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsmSubsequence {
    msm: Msm,
}

impl MsmSubsequence {
    /// Wrap a configured [`Msm`] calculator.
    #[must_use]
    pub fn new(msm: Msm) -> Self {
        Self { msm }
    }
}

fn squared_cost(candidate: &[f64], window: impl Iterator<Item = f64>, limit: f64) -> f64 {
    let mut sum = 0.0;
    for (&c, w) in candidate.iter().zip(window) {
        let diff = c - w;
        sum += diff * diff;
        if sum > limit {
            return f64::INFINITY;
        }
    }
    sum
}

fn mean_of(cost: f64, length: usize) -> f64 {
    if cost == 0.0 { 0.0 } else { cost / length as f64 }
}

impl SubsequenceDistance for Euclidean {
    fn name(&self) -> &'static str {
        "euclidean"
    }

    fn prepare(&self, window: &[f64]) -> Vec<f64> {
        window.to_vec()
    }

    fn window_cost(&self, candidate: &[f64], window: &[f64], limit: f64) -> f64 {
        squared_cost(candidate, window.iter().copied(), limit)
    }

    fn finalize(&self, cost: f64, length: usize) -> f64 {
        mean_of(cost, length)
    }

    fn cost_limit(&self, distance: f64, length: usize) -> f64 {
        distance * length as f64
    }
}

impl SubsequenceDistance for ZNormEuclidean {
    fn name(&self) -> &'static str {
        "znorm-euclidean"
    }

    fn prepare(&self, window: &[f64]) -> Vec<f64> {
        z_normalize(window)
    }

    fn window_cost(&self, candidate: &[f64], window: &[f64], limit: f64) -> f64 {
        let (mean, std) = mean_std(window);
        if std <= ZERO_VARIANCE_STD {
            return squared_cost(candidate, std::iter::repeat(0.0), limit);
        }
        squared_cost(candidate, window.iter().map(|&x| (x - mean) / std), limit)
    }

    fn finalize(&self, cost: f64, length: usize) -> f64 {
        mean_of(cost, length)
    }

    fn cost_limit(&self, distance: f64, length: usize) -> f64 {
        distance * length as f64
    }
}

impl SubsequenceDistance for MsmSubsequence {
    fn name(&self) -> &'static str {
        "msm"
    }

    fn descriptor(&self) -> String {
        format!(
            "{}(cost={}, band={})",
            self.name(),
            self.msm.cost(),
            self.msm.constraint()
        )
    }

    fn prepare(&self, window: &[f64]) -> Vec<f64> {
        window.to_vec()
    }

    fn window_cost(&self, candidate: &[f64], window: &[f64], limit: f64) -> f64 {
        let cutoff = limit.is_finite().then_some(limit);
        self.msm.cost_between(candidate, window, cutoff)
    }

    fn finalize(&self, cost: f64, _length: usize) -> f64 {
        cost
    }

    fn cost_limit(&self, distance: f64, _length: usize) -> f64 {
        distance
    }
}

/// Minimum distance between a candidate and any equally long window of `series`.
///
/// `candidate` holds one prepared row per channel and is compared with the
/// same number of leading channels of `series`; channel costs at one offset
/// are summed. Returns `f64::INFINITY` when no alignment beats `limit`
/// (pass `f64::INFINITY` for an exact distance).
///
/// When a series channel is shorter than the candidate the roles swap: the
/// prepared series is slid through the candidate instead.
#[must_use]
pub fn min_distance(
    metric: &dyn SubsequenceDistance,
    candidate: &[Vec<f64>],
    series: &[&[f64]],
    limit: f64,
) -> f64 {
    let Some(length) = candidate.first().map(Vec::len) else {
        return f64::INFINITY;
    };
    let channels = candidate.len().min(series.len());
    if length == 0 || channels == 0 {
        return f64::INFINITY;
    }
    let series = &series[..channels];
    let series_len = series.iter().map(|c| c.len()).min().unwrap_or(0);
    if series_len == 0 {
        return f64::INFINITY;
    }
    if series_len < length {
        let probes: Vec<Vec<f64>> = series.iter().map(|c| metric.prepare(&c[..series_len])).collect();
        return slide(metric, &probes, &candidate[..channels], series_len, limit);
    }
    slide(metric, &candidate[..channels], series, length, limit)
}

/// Lay `fixed` (one row per channel, `length` long) over every offset of `moving`.
fn slide<F, M>(
    metric: &dyn SubsequenceDistance,
    fixed: &[F],
    moving: &[M],
    length: usize,
    limit: f64,
) -> f64
where
    F: AsRef<[f64]>,
    M: AsRef<[f64]>,
{
    let moving_len = moving.iter().map(|m| m.as_ref().len()).min().unwrap_or(0);
    let cost_limit = metric.cost_limit(limit, length);
    let mut best = f64::INFINITY;
    for offset in 0..=moving_len - length {
        let bound = best.min(cost_limit);
        let mut total = 0.0;
        for (row, chan) in fixed.iter().zip(moving) {
            let window = &chan.as_ref()[offset..offset + length];
            total += metric.window_cost(row.as_ref(), window, bound - total);
            if total > bound {
                break;
            }
        }
        if total < best && total <= cost_limit {
            best = total;
        }
    }

    if best.is_finite() {
        metric.finalize(best, length)
    } else {
        f64::INFINITY
    }
}
