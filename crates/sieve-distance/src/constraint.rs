//! Warping window for elastic alignments.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Limits which cells of an alignment matrix may be visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandConstraint {
    /// Every cell is reachable.
    #[default]
    Unconstrained,

    /// Sakoe-Chiba band: cell (i,j) is reachable only if |i - j| <= radius.
    SakoeChibaRadius(usize),
}

impl BandConstraint {
    /// Band whose radius is `fraction` of `series_len`, rounded up.
    ///
    /// A fraction of 1.0 or more is equivalent to [`BandConstraint::Unconstrained`].
    #[must_use]
    pub fn from_fraction(fraction: f64, series_len: usize) -> Self {
        if !(fraction < 1.0) {
            return Self::Unconstrained;
        }
        let radius = (fraction.max(0.0) * series_len as f64).ceil() as usize;
        Self::SakoeChibaRadius(radius)
    }

    /// Reachable columns of `row` in a matrix with `n_cols` columns.
    #[must_use]
    pub fn column_range(&self, row: usize, n_cols: usize) -> Range<usize> {
        match *self {
            Self::Unconstrained => 0..n_cols,
            Self::SakoeChibaRadius(r) => row.saturating_sub(r).min(n_cols)..(row + r + 1).min(n_cols),
        }
    }

    /// Widest row of the band for a matrix with `n_cols` columns.
    #[must_use]
    pub fn band_width(&self, n_cols: usize) -> usize {
        match *self {
            Self::Unconstrained => n_cols,
            Self::SakoeChibaRadius(r) => (2 * r + 1).min(n_cols),
        }
    }
}

impl fmt::Display for BandConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unconstrained => f.write_str("unconstrained"),
            Self::SakoeChibaRadius(r) => write!(f, "sakoe-chiba(r={r})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconstrained_rows_span_all_columns() {
        let band = BandConstraint::Unconstrained;
        assert_eq!(band.column_range(0, 7), 0..7);
        assert_eq!(band.column_range(6, 7), 0..7);
        assert_eq!(band.band_width(7), 7);
    }

    #[test]
    fn radius_clips_at_edges() {
        let band = BandConstraint::SakoeChibaRadius(1);
        assert_eq!(band.column_range(0, 6), 0..2);
        assert_eq!(band.column_range(3, 6), 2..5);
        assert_eq!(band.column_range(5, 6), 4..6);
        assert_eq!(band.band_width(6), 3);
    }

    #[test]
    fn rows_past_the_columns_are_empty() {
        // Tall matrix: row 9 of a 10x4 alignment with radius 2 has no reachable cells.
        let band = BandConstraint::SakoeChibaRadius(2);
        assert!(band.column_range(9, 4).is_empty());
    }

    #[test]
    fn fraction_rounds_up_and_saturates() {
        assert_eq!(BandConstraint::from_fraction(0.1, 25), BandConstraint::SakoeChibaRadius(3));
        assert_eq!(BandConstraint::from_fraction(0.0, 25), BandConstraint::SakoeChibaRadius(0));
        assert_eq!(BandConstraint::from_fraction(1.0, 25), BandConstraint::Unconstrained);
    }

    #[test]
    fn display_names_the_band() {
        assert_eq!(BandConstraint::SakoeChibaRadius(4).to_string(), "sakoe-chiba(r=4)");
    }
}
