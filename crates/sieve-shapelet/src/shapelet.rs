//! Scored shapelets and the orderings used to rank them.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::quality::Score;

/// Where a candidate comes from in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    /// Index of the source series in the input dataset.
    pub series_id: usize,
    /// First sample of the window.
    pub start: usize,
    /// Window length.
    pub length: usize,
    /// First channel of the window.
    pub dimension: usize,
}

/// A scored candidate that owns its prepared content.
///
/// `content` holds one row per channel, each `length` long, already passed
/// through the discovery distance's `prepare` (e.g. z-normalised).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shapelet {
    candidate: Candidate,
    class_value: usize,
    quality: f64,
    separation_gap: Option<f64>,
    content: Vec<Vec<f64>>,
}

impl Shapelet {
    /// Finalize a candidate with its score.
    #[must_use]
    pub fn new(candidate: Candidate, class_value: usize, score: Score, content: Vec<Vec<f64>>) -> Self {
        Self {
            candidate,
            class_value,
            quality: score.quality,
            separation_gap: score.separation_gap,
            content,
        }
    }

    /// Source reference.
    #[must_use]
    pub fn candidate(&self) -> Candidate {
        self.candidate
    }

    /// Index of the source series in the input dataset.
    #[must_use]
    pub fn series_id(&self) -> usize {
        self.candidate.series_id
    }

    /// Start offset in the source series.
    #[must_use]
    pub fn start(&self) -> usize {
        self.candidate.start
    }

    /// Number of samples per channel.
    #[must_use]
    pub fn length(&self) -> usize {
        self.candidate.length
    }

    /// First channel of the source window.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.candidate.dimension
    }

    /// Class of the source series.
    #[must_use]
    pub fn class_value(&self) -> usize {
        self.class_value
    }

    /// Quality score; higher is better.
    #[must_use]
    pub fn quality(&self) -> f64 {
        self.quality
    }

    /// Separation gap of the best split, when the measure reports one.
    #[must_use]
    pub fn separation_gap(&self) -> Option<f64> {
        self.separation_gap
    }

    /// Prepared content, one row per channel.
    #[must_use]
    pub fn content(&self) -> &[Vec<f64>] {
        &self.content
    }

    /// Number of content rows.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.content.len()
    }

    /// Same source series and channel with overlapping windows.
    #[must_use]
    pub fn is_self_similar(&self, other: &Shapelet) -> bool {
        let (a, b) = (&self.candidate, &other.candidate);
        a.series_id == b.series_id
            && a.dimension == b.dimension
            && a.start < b.start + b.length
            && b.start < a.start + a.length
    }
}

impl fmt::Display for Shapelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "series {} [{}..{}) dim {} class {} quality {:.6}",
            self.candidate.series_id,
            self.candidate.start,
            self.candidate.start + self.candidate.length,
            self.candidate.dimension,
            self.class_value,
            self.quality
        )
    }
}

/// Ranking of shapelets, best first. Quality descending always comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeletOrder {
    /// Then separation gap descending (missing gaps last), then shorter first.
    #[default]
    SeparationGap,
    /// Then shorter first.
    ShortestFirst,
    /// Then longer first.
    LongestFirst,
}

impl ShapeletOrder {
    /// Compare on the ranking keys only.
    fn rank(self, a: &Shapelet, b: &Shapelet) -> Ordering {
        let by_quality = b.quality.total_cmp(&a.quality);
        let tail = match self {
            Self::SeparationGap => {
                let gap = |s: &Shapelet| s.separation_gap.unwrap_or(f64::NEG_INFINITY);
                gap(b)
                    .total_cmp(&gap(a))
                    .then_with(|| a.length().cmp(&b.length()))
            }
            Self::ShortestFirst => a.length().cmp(&b.length()),
            Self::LongestFirst => b.length().cmp(&a.length()),
        };
        by_quality.then(tail)
    }

    /// Total order: ranking keys, then series id, start and dimension ascending.
    #[must_use]
    pub fn compare(self, a: &Shapelet, b: &Shapelet) -> Ordering {
        self.rank(a, b).then_with(|| {
            let key = |s: &Shapelet| (s.series_id(), s.start(), s.dimension());
            key(a).cmp(&key(b))
        })
    }

    /// True when `a` and `b` tie on every ranking key.
    #[must_use]
    pub fn same_rank(self, a: &Shapelet, b: &Shapelet) -> bool {
        self.rank(a, b) == Ordering::Equal
    }

    /// Sort best first.
    pub fn sort(self, shapelets: &mut [Shapelet]) {
        shapelets.sort_by(|a, b| self.compare(a, b));
    }
}

impl fmt::Display for ShapeletOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SeparationGap => "separation-gap",
            Self::ShortestFirst => "shortest-first",
            Self::LongestFirst => "longest-first",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
pub(crate) fn test_shapelet(
    series_id: usize,
    start: usize,
    length: usize,
    quality: f64,
    separation_gap: Option<f64>,
) -> Shapelet {
    Shapelet::new(
        Candidate {
            series_id,
            start,
            length,
            dimension: 0,
        },
        0,
        Score {
            quality,
            separation_gap,
        },
        vec![vec![start as f64; length]],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_requires_same_series_and_dimension() {
        let a = test_shapelet(0, 2, 4, 1.0, None); // [2, 6)
        assert!(a.is_self_similar(&test_shapelet(0, 5, 3, 1.0, None)));
        assert!(!a.is_self_similar(&test_shapelet(0, 6, 3, 1.0, None)));
        assert!(!a.is_self_similar(&test_shapelet(1, 2, 4, 1.0, None)));
    }

    #[test]
    fn separation_gap_breaks_quality_ties() {
        let order = ShapeletOrder::SeparationGap;
        let wide = test_shapelet(0, 0, 5, 1.0, Some(2.0));
        let narrow = test_shapelet(1, 0, 3, 1.0, Some(1.0));
        let missing = test_shapelet(2, 0, 3, 1.0, None);
        let better = test_shapelet(3, 0, 9, 1.5, None);
        let mut v = vec![missing.clone(), narrow.clone(), wide.clone(), better.clone()];
        order.sort(&mut v);
        assert_eq!(v, vec![better, wide, narrow, missing]);
    }

    #[test]
    fn length_orders() {
        let short = test_shapelet(0, 0, 3, 1.0, None);
        let long = test_shapelet(1, 0, 7, 1.0, None);
        assert_eq!(ShapeletOrder::ShortestFirst.compare(&short, &long), Ordering::Less);
        assert_eq!(ShapeletOrder::LongestFirst.compare(&short, &long), Ordering::Greater);
    }

    #[test]
    fn position_completes_the_order() {
        let a = test_shapelet(0, 1, 3, 1.0, Some(0.5));
        let b = test_shapelet(0, 4, 3, 1.0, Some(0.5));
        let order = ShapeletOrder::default();
        assert!(order.same_rank(&a, &b));
        assert_eq!(order.compare(&a, &b), Ordering::Less);
    }
}
