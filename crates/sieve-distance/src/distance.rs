//! MSM distance newtype.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// A non-negative move-split-merge alignment cost.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct MsmDistance(f64);

impl MsmDistance {
    /// Sentinel returned when an alignment is abandoned.
    pub const INFINITY: Self = Self(f64::INFINITY);

    pub(crate) fn new(value: f64) -> Self {
        Self(value)
    }

    /// Return the raw cost.
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// True when the alignment was abandoned before completion.
    #[must_use]
    pub fn is_abandoned(self) -> bool {
        self.0.is_infinite()
    }

    /// Total ordering comparison using [`f64::total_cmp`].
    #[must_use]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for MsmDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_six_decimals() {
        assert_eq!(MsmDistance::new(0.25).to_string(), "0.250000");
    }

    #[test]
    fn abandoned_sorts_last() {
        let mut ds = [MsmDistance::INFINITY, MsmDistance::new(3.0), MsmDistance::new(1.5)];
        ds.sort_by(MsmDistance::total_cmp);
        assert_eq!(ds[0].value(), 1.5);
        assert!(ds[2].is_abandoned());
    }
}
