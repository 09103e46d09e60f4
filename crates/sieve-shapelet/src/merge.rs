//! Bounded best-k lists and the sorted merge that maintains them.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sieve_distance::SubsequenceDistance;

use crate::pruning::contains_matching_shapelet;
use crate::shapelet::{Shapelet, ShapeletOrder};

/// Rules applied while merging.
#[derive(Debug, Clone, Copy)]
pub struct MergeRules<'a> {
    /// Ranking used for both inputs and the output.
    pub order: ShapeletOrder,
    /// Skip shapelets whose content matches one already on the same rank plateau.
    pub prune_matching: bool,
    /// Skip shapelets self-similar to one already kept.
    pub guard_self_similar: bool,
    /// Distance used to compare contents when `prune_matching` is set.
    pub metric: &'a dyn SubsequenceDistance,
}

/// Merge two best-first lists into one of at most `k` shapelets.
///
/// Takes whichever head ranks better, the new list winning ties, until `k`
/// shapelets are kept or both inputs run out.
#[must_use]
pub fn combine(
    k: usize,
    best_so_far: Vec<Shapelet>,
    new: Vec<Shapelet>,
    rules: &MergeRules<'_>,
) -> Vec<Shapelet> {
    let mut kept: Vec<Shapelet> = Vec::with_capacity(k.min(best_so_far.len() + new.len()));
    let mut old = best_so_far.into_iter().peekable();
    let mut new = new.into_iter().peekable();

    while kept.len() < k {
        let take_new = match (old.peek(), new.peek()) {
            (None, None) => break,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (Some(a), Some(b)) => rules.order.compare(a, b) != Ordering::Less,
        };
        let next = if take_new { new.next() } else { old.next() };
        let Some(next) = next else { break };

        if rules.prune_matching
            && contains_matching_shapelet(&next, &kept, rules.order, rules.metric)
        {
            continue;
        }
        if rules.guard_self_similar && kept.iter().any(|s| s.is_self_similar(&next)) {
            continue;
        }
        kept.push(next);
    }
    kept
}

/// The retained shapelets during discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BestShapelets {
    /// One list of capacity `k`.
    Global {
        /// Capacity.
        k: usize,
        /// Best first.
        list: Vec<Shapelet>,
    },
    /// One list per class, each of capacity `per_class`.
    Balanced {
        /// Capacity of each class list.
        per_class: usize,
        /// Best first, indexed by class.
        lists: Vec<Vec<Shapelet>>,
    },
}

impl BestShapelets {
    /// An empty global list.
    #[must_use]
    pub fn global(k: usize) -> Self {
        Self::Global {
            k,
            list: Vec::new(),
        }
    }

    /// Empty per-class lists splitting `k` evenly over `n_classes`.
    #[must_use]
    pub fn balanced(k: usize, n_classes: usize) -> Self {
        Self::Balanced {
            per_class: k / n_classes.max(1),
            lists: vec![Vec::new(); n_classes],
        }
    }

    /// Quality a new shapelet of `class` must beat, once the relevant list is full.
    #[must_use]
    pub fn worst_quality(&self, class: usize) -> Option<f64> {
        let (capacity, list) = match self {
            Self::Global { k, list } => (*k, list),
            Self::Balanced { per_class, lists } => (*per_class, lists.get(class)?),
        };
        if list.len() < capacity {
            return None;
        }
        list.last().map(Shapelet::quality)
    }

    /// True when a retained shapelet was cut from series `series_id`.
    #[must_use]
    pub fn holds_series(&self, series_id: usize) -> bool {
        match self {
            Self::Global { list, .. } => list.iter().any(|s| s.series_id() == series_id),
            Self::Balanced { lists, .. } => lists
                .iter()
                .flatten()
                .any(|s| s.series_id() == series_id),
        }
    }

    /// Merge a series' sorted candidates into the list for `class`.
    pub fn merge(&mut self, class: usize, candidates: Vec<Shapelet>, rules: &MergeRules<'_>) {
        match self {
            Self::Global { k, list } => {
                let current = std::mem::take(list);
                *list = combine(*k, current, candidates, rules);
            }
            Self::Balanced { per_class, lists } => {
                if let Some(list) = lists.get_mut(class) {
                    let current = std::mem::take(list);
                    *list = combine(*per_class, current, candidates, rules);
                }
            }
        }
    }

    /// Number of retained shapelets.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Global { list, .. } => list.len(),
            Self::Balanced { lists, .. } => lists.iter().map(Vec::len).sum(),
        }
    }

    /// True when nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Final shapelet set: the global list, or the class lists concatenated in class order.
    #[must_use]
    pub fn into_shapelets(self) -> Vec<Shapelet> {
        match self {
            Self::Global { list, .. } => list,
            Self::Balanced { lists, .. } => lists.into_iter().flatten().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use sieve_distance::Euclidean;

    use super::*;
    use crate::shapelet::test_shapelet;

    fn rules(prune_matching: bool, guard_self_similar: bool) -> MergeRules<'static> {
        MergeRules {
            order: ShapeletOrder::ShortestFirst,
            prune_matching,
            guard_self_similar,
            metric: &Euclidean,
        }
    }

    #[test]
    fn merge_keeps_top_k_sorted() {
        let old = vec![test_shapelet(0, 0, 3, 0.9, None), test_shapelet(1, 0, 3, 0.5, None)];
        let new = vec![test_shapelet(2, 0, 3, 0.7, None), test_shapelet(2, 5, 3, 0.1, None)];
        let merged = combine(3, old, new, &rules(false, false));
        let q: Vec<f64> = merged.iter().map(Shapelet::quality).collect();
        assert_eq!(q, vec![0.9, 0.7, 0.5]);
    }

    #[test]
    fn stops_when_inputs_run_out() {
        let merged = combine(10, vec![test_shapelet(0, 0, 3, 0.9, None)], vec![], &rules(false, false));
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn duplicate_content_is_skipped_and_the_slot_refilled() {
        let old = vec![test_shapelet(0, 4, 3, 0.8, None)];
        let new = vec![test_shapelet(1, 4, 3, 0.8, None), test_shapelet(1, 9, 3, 0.2, None)];
        let merged = combine(2, old, new, &rules(true, false));
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[1].start(), 9);
    }

    #[test]
    fn holds_series_checks_every_class_list() {
        let mut best = BestShapelets::balanced(4, 2);
        best.merge(1, vec![test_shapelet(3, 0, 3, 0.5, None)], &rules(false, true));
        assert!(best.holds_series(3));
        assert!(!best.holds_series(0));
    }

    #[test]
    fn self_similar_guard_spans_both_inputs() {
        let old = vec![test_shapelet(0, 0, 4, 0.8, None)];
        let new = vec![test_shapelet(0, 2, 4, 0.9, None)];
        let merged = combine(5, old, new, &rules(false, true));
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quality(), 0.9);
    }

    #[test]
    fn worst_quality_only_when_full() {
        let mut best = BestShapelets::global(2);
        best.merge(0, vec![test_shapelet(0, 0, 3, 0.9, None)], &rules(false, false));
        assert_eq!(best.worst_quality(0), None);
        best.merge(1, vec![test_shapelet(1, 0, 3, 0.4, None)], &rules(false, false));
        assert_eq!(best.worst_quality(0), Some(0.4));
    }

    #[test]
    fn balanced_lists_fill_per_class() {
        let mut best = BestShapelets::balanced(4, 2);
        let many: Vec<Shapelet> = (0..5).map(|i| test_shapelet(0, i * 4, 3, 1.0 - i as f64 * 0.1, None)).collect();
        best.merge(0, many, &rules(false, false));
        best.merge(1, vec![test_shapelet(1, 0, 3, 0.1, None)], &rules(false, false));
        assert_eq!(best.worst_quality(0), Some(0.9));
        assert_eq!(best.worst_quality(1), None);
        let all = best.into_shapelets();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].series_id(), 1);
    }
}
