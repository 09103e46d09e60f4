//! Candidate quality: order-lines, quality measures and their online bounds.
//!
//! A candidate is compared with every other training series; each comparison
//! yields an [`OrderLineEntry`]. A [`QualityMeasure`] turns the full
//! order-line into a [`Score`]. While the order-line is still being built a
//! [`QualityBound`] can prove that the candidate cannot beat the worst
//! retained shapelet, so the remaining distances need not be computed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ShapeletError;
use crate::f_stat::FStat;
use crate::info_gain::InformationGain;

/// Distance from a candidate to one series, with that series' class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderLineEntry {
    /// Minimum subsequence distance.
    pub distance: f64,
    /// Class of the series, as seen by the quality measure.
    pub class: usize,
}

impl OrderLineEntry {
    /// Pair a distance with a class.
    #[must_use]
    pub fn new(distance: f64, class: usize) -> Self {
        Self { distance, class }
    }
}

/// Number of order-line entries expected per class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCounts(Vec<usize>);

impl ClassCounts {
    /// Wrap per-class counts indexed by class.
    #[must_use]
    pub fn new(counts: Vec<usize>) -> Self {
        Self(counts)
    }

    /// Count for `class` (zero when out of range).
    #[must_use]
    pub fn get(&self, class: usize) -> usize {
        self.0.get(class).copied().unwrap_or(0)
    }

    /// Number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.0.len()
    }

    /// Sum over all classes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Counts indexed by class.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

/// Result of scoring an order-line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Higher is better.
    pub quality: f64,
    /// Mean distance above the best split minus mean distance below it.
    pub separation_gap: Option<f64>,
}

/// Scores a candidate from its order-line.
///
/// `score` must not depend on the order of `order_line`.
pub trait QualityMeasure: Send + Sync + fmt::Debug {
    /// Registry name of this measure.
    fn name(&self) -> &'static str;

    /// Score a complete order-line whose class totals are `counts`.
    fn score(&self, order_line: &[OrderLineEntry], counts: &ClassCounts) -> Score;

    /// Start an online bound for an order-line that will hold `counts`.
    ///
    /// The bound only answers once `start_percentage` percent of the entries
    /// have been seen. `None` when the measure has no bound.
    fn bound(&self, counts: &ClassCounts, start_percentage: f64) -> Option<Box<dyn QualityBound>> {
        let _ = (counts, start_percentage);
        None
    }
}

/// Optimistic quality of a partially built order-line.
pub trait QualityBound: Send {
    /// Add one more entry.
    fn update(&mut self, entry: OrderLineEntry);

    /// True when no completion of the order-line can score above `best_so_far`.
    fn should_prune(&self, best_so_far: f64) -> bool;
}

/// Shannon entropy (base 2) of a class histogram.
pub(crate) fn entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy reduction of splitting `parent` into `left` and the remainder.
pub(crate) fn split_gain(parent: &[usize], parent_entropy: f64, left: &[usize]) -> f64 {
    let total: usize = parent.iter().sum();
    if total == 0 {
        return 0.0;
    }
    let right: Vec<usize> = parent.iter().zip(left).map(|(p, l)| p - l).collect();
    let n_left: usize = left.iter().sum();
    let n_right = total - n_left;
    let total = total as f64;
    parent_entropy
        - (n_left as f64 / total) * entropy(left)
        - (n_right as f64 / total) * entropy(&right)
}

/// Builds a quality measure.
pub type QualityFactory = fn() -> Arc<dyn QualityMeasure>;

/// Registry of quality measures keyed by name.
///
/// [`QualityRegistry::default`] holds `information-gain` and `f-stat`.
#[derive(Debug, Clone)]
pub struct QualityRegistry {
    factories: BTreeMap<String, QualityFactory>,
}

impl Default for QualityRegistry {
    fn default() -> Self {
        let mut registry = Self {
            factories: BTreeMap::new(),
        };
        registry.register("information-gain", || Arc::new(InformationGain));
        registry.register("f-stat", || Arc::new(FStat));
        registry
    }
}

impl QualityRegistry {
    /// Register (or replace) the factory for `name`.
    pub fn register(&mut self, name: &str, factory: QualityFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the measure registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::UnknownQuality`] if `name` is not registered.
    pub fn create(&self, name: &str) -> Result<Arc<dyn QualityMeasure>, ShapeletError> {
        self.factories
            .get(name)
            .map(|factory| factory())
            .ok_or_else(|| ShapeletError::UnknownQuality {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entropy_of_balanced_binary_is_one() {
        assert!((entropy(&[4, 4]) - 1.0).abs() < 1e-12);
        assert_eq!(entropy(&[5, 0]), 0.0);
        assert_eq!(entropy(&[0, 0]), 0.0);
    }

    #[test]
    fn perfect_split_recovers_parent_entropy() {
        let parent = [3, 3];
        let h = entropy(&parent);
        assert!((split_gain(&parent, h, &[3, 0]) - 1.0).abs() < 1e-12);
        assert!(split_gain(&parent, h, &[0, 0]).abs() < 1e-12);
    }

    #[test]
    fn registry_resolves_builtins() {
        let registry = QualityRegistry::default();
        assert_eq!(registry.create("f-stat").unwrap().name(), "f-stat");
        assert_eq!(
            registry.create("information-gain").unwrap().name(),
            "information-gain"
        );
        match registry.create("gini").unwrap_err() {
            ShapeletError::UnknownQuality { available, .. } => {
                assert_eq!(available, "f-stat, information-gain");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
