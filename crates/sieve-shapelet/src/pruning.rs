//! Self-similarity and near-duplicate pruning.

use sieve_distance::{SubsequenceDistance, min_distance};

use crate::shapelet::{Shapelet, ShapeletOrder};

/// Content distance below which two shapelets count as the same.
pub const MATCH_TOLERANCE: f64 = 1e-6;

/// Keep the first shapelet of every self-similar group.
///
/// `shapelets` should be sorted best first, so the kept member of each group
/// is the best one. Greedy: a shapelet removed by an earlier one cannot
/// remove later ones.
#[must_use]
pub fn remove_self_similar(shapelets: Vec<Shapelet>) -> Vec<Shapelet> {
    let mut removed = vec![false; shapelets.len()];
    for i in 0..shapelets.len() {
        if removed[i] {
            continue;
        }
        for j in i + 1..shapelets.len() {
            if !removed[j] && shapelets[i].is_self_similar(&shapelets[j]) {
                removed[j] = true;
            }
        }
    }
    shapelets
        .into_iter()
        .zip(removed)
        .filter_map(|(s, gone)| (!gone).then_some(s))
        .collect()
}

/// True when the tail of `sorted` holds a near-identical copy of `candidate`.
///
/// Scans backwards through the shapelets that tie with `candidate` on the
/// ranking keys of `order` and stops at the first one that does not.
#[must_use]
pub fn contains_matching_shapelet(
    candidate: &Shapelet,
    sorted: &[Shapelet],
    order: ShapeletOrder,
    metric: &dyn SubsequenceDistance,
) -> bool {
    for existing in sorted.iter().rev() {
        if !order.same_rank(existing, candidate) {
            return false;
        }
        if existing.n_channels() != candidate.n_channels() {
            continue;
        }
        let rows: Vec<&[f64]> = candidate.content().iter().map(Vec::as_slice).collect();
        if min_distance(metric, existing.content(), &rows, MATCH_TOLERANCE) < MATCH_TOLERANCE {
            return true;
        }
    }
    false
}
