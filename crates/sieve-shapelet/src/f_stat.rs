//! One-way ANOVA F-statistic of distances grouped by class.

use crate::quality::{ClassCounts, OrderLineEntry, QualityMeasure, Score};

/// F-statistic quality. Has no online bound.
///
/// Classes absent from the order-line are ignored. Undefined statistics
/// (fewer than two classes, or no within-class degrees of freedom) score
/// zero; a perfect separation with zero within-class variance scores
/// `f64::MAX`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FStat;

impl QualityMeasure for FStat {
    fn name(&self) -> &'static str {
        "f-stat"
    }

    fn score(&self, order_line: &[OrderLineEntry], counts: &ClassCounts) -> Score {
        let n_classes = order_line
            .iter()
            .map(|e| e.class + 1)
            .max()
            .unwrap_or(0)
            .max(counts.n_classes());
        let mut n = vec![0usize; n_classes];
        let mut sums = vec![0.0; n_classes];
        let mut sum_squares = vec![0.0; n_classes];
        for e in order_line {
            n[e.class] += 1;
            sums[e.class] += e.distance;
            sum_squares[e.class] += e.distance * e.distance;
        }

        let groups = n.iter().filter(|&&c| c > 0).count();
        let total = order_line.len();
        if groups < 2 || total <= groups {
            return Score {
                quality: 0.0,
                separation_gap: None,
            };
        }

        let grand_mean = sums.iter().sum::<f64>() / total as f64;
        let mut between = 0.0;
        let mut within = 0.0;
        for c in (0..n_classes).filter(|&c| n[c] > 0) {
            let size = n[c] as f64;
            let mean = sums[c] / size;
            between += size * (mean - grand_mean).powi(2);
            within += (sum_squares[c] - size * mean * mean).max(0.0);
        }

        let f = (between / (groups - 1) as f64) / (within / (total - groups) as f64);
        let quality = if f.is_nan() {
            0.0
        } else if f.is_infinite() {
            f64::MAX
        } else {
            f
        };
        Score {
            quality,
            separation_gap: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(pairs: &[(f64, usize)]) -> Vec<OrderLineEntry> {
        pairs.iter().map(|&(d, c)| OrderLineEntry::new(d, c)).collect()
    }

    #[test]
    fn matches_textbook_anova() {
        // Groups {1,2,3} and {4,5,6}: SSB = 13.5, SSW = 4, F = 13.5 / (4 / 4) = 13.5
        let ol = line(&[(1.0, 0), (2.0, 0), (3.0, 0), (4.0, 1), (5.0, 1), (6.0, 1)]);
        let s = FStat.score(&ol, &ClassCounts::new(vec![3, 3]));
        assert!((s.quality - 13.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        let counts = ClassCounts::new(vec![2, 0]);
        let s = FStat.score(&line(&[(1.0, 0), (2.0, 0)]), &counts);
        assert_eq!(s.quality, 0.0);

        // Both groups constant and equal: 0 / 0.
        let s = FStat.score(&line(&[(1.0, 0), (1.0, 0), (1.0, 1), (1.0, 1)]), &counts);
        assert_eq!(s.quality, 0.0);
    }

    #[test]
    fn zero_within_variance_is_maximal() {
        let s = FStat.score(
            &line(&[(1.0, 0), (1.0, 0), (2.0, 1), (2.0, 1)]),
            &ClassCounts::new(vec![2, 2]),
        );
        assert_eq!(s.quality, f64::MAX);
    }

    #[test]
    fn has_no_bound() {
        assert!(FStat.bound(&ClassCounts::new(vec![2, 2]), 10.0).is_none());
    }
}
