//! Move-Split-Merge (MSM) elastic distance.
//!
//! Stefan, Athitsos and Das (2013). Each aligned pair costs `|a_i - b_j|`; a
//! split or merge costs `c`, plus the distance to the nearer neighbour when
//! the new point does not lie between them.

use rayon::prelude::*;
use tracing::instrument;

use crate::constraint::BandConstraint;
use crate::distance::MsmDistance;
use crate::error::DistanceError;
use crate::matrix::{DistanceMatrix, unpack_index};
use crate::series::{TimeSeries, TimeSeriesView};

/// Immutable MSM configuration. Thread-safe and copyable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Msm {
    cost: f64,
    constraint: BandConstraint,
}

impl Default for Msm {
    fn default() -> Self {
        Self {
            cost: Self::DEFAULT_COST,
            constraint: BandConstraint::Unconstrained,
        }
    }
}

impl Msm {
    /// Split/merge cost used when none is given.
    pub const DEFAULT_COST: f64 = 0.1;

    /// Create an unconstrained MSM calculator with split/merge cost `cost`.
    ///
    /// # Errors
    ///
    /// Returns [`DistanceError::InvalidCost`] if `cost` is negative or not finite.
    pub fn new(cost: f64) -> Result<Self, DistanceError> {
        if !cost.is_finite() || cost < 0.0 {
            return Err(DistanceError::InvalidCost { cost });
        }
        Ok(Self {
            cost,
            constraint: BandConstraint::Unconstrained,
        })
    }

    /// Restrict alignments to `constraint`.
    #[must_use]
    pub fn with_constraint(mut self, constraint: BandConstraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Return the split/merge cost.
    #[must_use]
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Return the band constraint.
    #[must_use]
    pub fn constraint(&self) -> BandConstraint {
        self.constraint
    }

    /// MSM distance between two series.
    ///
    /// Runs in O(n * bw) time with two rolling rows of O(bw) space. Returns
    /// [`MsmDistance::INFINITY`] when the band cannot reach the final cell.
    #[must_use]
    pub fn distance(&self, a: TimeSeriesView<'_>, b: TimeSeriesView<'_>) -> MsmDistance {
        MsmDistance::new(self.cost_between(a.as_slice(), b.as_slice(), None))
    }

    /// MSM distance with early abandoning.
    ///
    /// Returns [`MsmDistance::INFINITY`] as soon as the cheapest cell of a row
    /// exceeds `cutoff`. Exact otherwise: a finite result equals
    /// [`distance`][Self::distance].
    #[must_use]
    pub fn distance_with_cutoff(
        &self,
        a: TimeSeriesView<'_>,
        b: TimeSeriesView<'_>,
        cutoff: f64,
    ) -> MsmDistance {
        MsmDistance::new(self.cost_between(a.as_slice(), b.as_slice(), Some(cutoff)))
    }

    /// Pairwise MSM distances, computed in parallel over the packed lower triangle.
    #[must_use]
    #[instrument(skip(self, series), fields(n = series.len(), cost = self.cost))]
    pub fn pairwise(&self, series: &[TimeSeries]) -> DistanceMatrix {
        let n = series.len();
        let total = n * n.saturating_sub(1) / 2;
        let distances = (0..total)
            .into_par_iter()
            .map(|flat| {
                let (i, j) = unpack_index(flat);
                self.distance(series[i].as_view(), series[j].as_view())
            })
            .collect();
        DistanceMatrix::from_packed(n, distances)
    }

    /// Cost of splitting/merging `new` next to neighbours `x` and `y`.
    fn split_merge(&self, new: f64, x: f64, y: f64) -> f64 {
        if (x <= new && new <= y) || (y <= new && new <= x) {
            self.cost
        } else {
            self.cost + (new - x).abs().min((new - y).abs())
        }
    }

    /// Rolling-row MSM over raw slices.
    ///
    /// Row buffers hold `bw + 2` slots with an INF sentinel on each side, so
    /// predecessors outside the band read as unreachable.
    pub(crate) fn cost_between(&self, a: &[f64], b: &[f64], cutoff: Option<f64>) -> f64 {
        let n = a.len();
        let m = b.len();
        if n == 0 || m == 0 {
            return f64::INFINITY;
        }

        let buf_width = self.constraint.band_width(m) + 2;
        let mut prev = vec![f64::INFINITY; buf_width];
        let mut curr = vec![f64::INFINITY; buf_width];
        let mut prev_start = 0usize;

        let read = |buf: &[f64], col: usize, start: usize| -> f64 {
            if col < start {
                return f64::INFINITY;
            }
            buf.get(col - start + 1).copied().unwrap_or(f64::INFINITY)
        };

        for i in 0..n {
            curr.fill(f64::INFINITY);
            let cols = self.constraint.column_range(i, m);
            let start = cols.start;
            let mut row_min = f64::INFINITY;

            for j in cols {
                let slot = j - start + 1;
                let value = if i == 0 && j == 0 {
                    (a[0] - b[0]).abs()
                } else {
                    let mut best = f64::INFINITY;
                    if i > 0 && j > 0 {
                        best = best.min(read(&prev, j - 1, prev_start) + (a[i] - b[j]).abs());
                    }
                    if i > 0 {
                        best = best.min(read(&prev, j, prev_start) + self.split_merge(a[i], a[i - 1], b[j]));
                    }
                    if j > start {
                        best = best.min(curr[slot - 1] + self.split_merge(b[j], a[i], b[j - 1]));
                    }
                    best
                };
                curr[slot] = value;
                row_min = row_min.min(value);
            }

            // Every alignment crosses every row and costs never decrease along a path.
            if let Some(c) = cutoff
                && i < n - 1
                && row_min > c
            {
                return f64::INFINITY;
            }

            prev_start = start;
            std::mem::swap(&mut prev, &mut curr);
        }

        let last = read(&prev, m - 1, prev_start);
        match cutoff {
            Some(c) if last > c => f64::INFINITY,
            _ => last,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    fn random_series(rng: &mut ChaCha8Rng, len: usize) -> TimeSeries {
        ts(&(0..len).map(|_| rng.gen_range(-2.0..2.0)).collect::<Vec<_>>())
    }

    #[test]
    fn identical_series_cost_nothing() {
        let a = ts(&[1.0, 2.0, 0.5, -1.0]);
        assert_eq!(Msm::default().distance(a.as_view(), a.as_view()).value(), 0.0);
    }

    #[test]
    fn single_points_cost_their_gap() {
        let d = Msm::default().distance(ts(&[0.0]).as_view(), ts(&[1.0]).as_view());
        assert!((d.value() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn repeated_point_costs_one_split() {
        // [0, 0] -> [0]: merge the two zeros, cost c.
        let msm = Msm::new(0.3).unwrap();
        let d = msm.distance(ts(&[0.0, 0.0]).as_view(), ts(&[0.0]).as_view());
        assert!((d.value() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn move_then_merge() {
        // [0, 5] -> [5]: move 0 to 5 (cost 5), then merge (cost c).
        let d = Msm::default().distance(ts(&[0.0, 5.0]).as_view(), ts(&[5.0]).as_view());
        assert!((d.value() - 5.1).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_split_adds_neighbour_gap() {
        // [1, 3] vs [1, 3, 4]: split 3 into 3,4 costs c + |4 - 3|.
        let d = Msm::default().distance(ts(&[1.0, 3.0]).as_view(), ts(&[1.0, 3.0, 4.0]).as_view());
        assert!((d.value() - 1.1).abs() < 1e-12);
    }

    #[test]
    fn symmetric_and_triangle_on_random_data() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let msm = Msm::default();
        for _ in 0..20 {
            let a = random_series(&mut rng, 12);
            let b = random_series(&mut rng, 9);
            let c = random_series(&mut rng, 15);
            let ab = msm.distance(a.as_view(), b.as_view()).value();
            let ba = msm.distance(b.as_view(), a.as_view()).value();
            let bc = msm.distance(b.as_view(), c.as_view()).value();
            let ac = msm.distance(a.as_view(), c.as_view()).value();
            assert!((ab - ba).abs() < 1e-9, "asymmetric: {ab} vs {ba}");
            assert!(ac <= ab + bc + 1e-9, "triangle violated: {ac} > {ab} + {bc}");
        }
    }

    #[test]
    fn band_never_cheaper_than_unconstrained() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let free = Msm::default();
        let banded = Msm::default().with_constraint(BandConstraint::SakoeChibaRadius(1));
        for _ in 0..20 {
            let a = random_series(&mut rng, 10);
            let b = random_series(&mut rng, 10);
            let f = free.distance(a.as_view(), b.as_view()).value();
            let r = banded.distance(a.as_view(), b.as_view()).value();
            assert!(r >= f - 1e-12);
        }
    }

    #[test]
    fn zero_radius_is_lockstep() {
        let msm = Msm::default().with_constraint(BandConstraint::SakoeChibaRadius(0));
        let d = msm.distance(ts(&[0.0, 1.0, 2.0]).as_view(), ts(&[1.0, 1.0, 0.0]).as_view());
        assert!((d.value() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn band_that_misses_the_corner_is_infinite() {
        let msm = Msm::default().with_constraint(BandConstraint::SakoeChibaRadius(1));
        let d = msm.distance(ts(&[0.0; 6]).as_view(), ts(&[0.0; 2]).as_view());
        assert!(d.is_abandoned());
    }

    #[test]
    fn cutoff_is_exact_or_infinite() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let msm = Msm::default();
        for _ in 0..30 {
            let a = random_series(&mut rng, 16);
            let b = random_series(&mut rng, 16);
            let full = msm.distance(a.as_view(), b.as_view()).value();
            let cutoff = rng.gen_range(0.0..full * 2.0);
            let pruned = msm.distance_with_cutoff(a.as_view(), b.as_view(), cutoff).value();
            if full <= cutoff {
                assert!((pruned - full).abs() < 1e-12);
            } else {
                assert!(pruned.is_infinite());
            }
        }
    }

    #[test]
    fn rejects_negative_cost() {
        assert!(matches!(Msm::new(-0.5), Err(DistanceError::InvalidCost { .. })));
        assert!(matches!(Msm::new(f64::NAN), Err(DistanceError::InvalidCost { .. })));
    }

    #[test]
    fn pairwise_matches_individual_distances() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let series: Vec<_> = (0..6).map(|_| random_series(&mut rng, 8)).collect();
        let msm = Msm::default();
        let matrix = msm.pairwise(&series);
        assert_eq!(matrix.len(), 6);
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i == j {
                    0.0
                } else {
                    msm.distance(series[i].as_view(), series[j].as_view()).value()
                };
                assert!((matrix.get(i, j).value() - expected).abs() < 1e-12);
            }
        }
    }
}
