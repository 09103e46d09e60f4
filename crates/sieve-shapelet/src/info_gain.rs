//! Information gain of the best order-line split, with an exact optimistic bound.

use crate::quality::{
    ClassCounts, OrderLineEntry, QualityBound, QualityMeasure, Score, entropy, split_gain,
};

/// Above this many classes with unseen entries the bound stops enumerating
/// assignments and falls back to the parent entropy.
const MAX_ENUMERATED_CLASSES: usize = 12;

/// Entropy reduction of the best threshold on the sorted order-line.
///
/// Thresholds are only tested between distinct distances, never inside a
/// run of ties. An order-line with fewer than two distinct distances scores
/// zero with no separation gap.
#[derive(Debug, Clone, Copy, Default)]
pub struct InformationGain;

impl QualityMeasure for InformationGain {
    fn name(&self) -> &'static str {
        "information-gain"
    }

    fn score(&self, order_line: &[OrderLineEntry], counts: &ClassCounts) -> Score {
        let n_classes = order_line
            .iter()
            .map(|e| e.class + 1)
            .max()
            .unwrap_or(0)
            .max(counts.n_classes());
        let mut parent = vec![0usize; n_classes];
        for e in order_line {
            parent[e.class] += 1;
        }
        let parent_entropy = entropy(&parent);

        let mut sorted = order_line.to_vec();
        sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        let total_sum: f64 = sorted.iter().map(|e| e.distance).sum();

        let mut left = vec![0usize; n_classes];
        let mut left_sum = 0.0;
        // (gain, split index, left sum at split)
        let mut best: Option<(f64, usize, f64)> = None;

        for i in 1..sorted.len() {
            let prev = sorted[i - 1];
            left[prev.class] += 1;
            left_sum += prev.distance;
            if sorted[i].distance == prev.distance {
                continue;
            }
            let gain = split_gain(&parent, parent_entropy, &left);
            if best.is_none_or(|(g, _, _)| gain > g) {
                best = Some((gain, i, left_sum));
            }
        }

        match best {
            Some((gain, split, below)) => {
                let above = total_sum - below;
                let n_above = (sorted.len() - split) as f64;
                Score {
                    quality: gain,
                    separation_gap: Some(above / n_above - below / split as f64),
                }
            }
            None => Score {
                quality: 0.0,
                separation_gap: None,
            },
        }
    }

    fn bound(&self, counts: &ClassCounts, start_percentage: f64) -> Option<Box<dyn QualityBound>> {
        Some(Box::new(InformationGainBound::new(counts, start_percentage)))
    }
}

/// Optimistic information gain of a partial order-line.
///
/// Information gain is convex in how the unseen entries of each class are
/// split between the two sides, so its maximum over all completions is
/// reached with every class's unseen entries on one side. The bound tries
/// each such assignment at every split of the seen entries.
#[derive(Debug)]
struct InformationGainBound {
    parent: Vec<usize>,
    parent_entropy: f64,
    start_percentage: f64,
    seen: Vec<OrderLineEntry>,
    seen_counts: Vec<usize>,
}

impl InformationGainBound {
    fn new(counts: &ClassCounts, start_percentage: f64) -> Self {
        let parent = counts.as_slice().to_vec();
        Self {
            parent_entropy: entropy(&parent),
            seen_counts: vec![0; parent.len()],
            parent,
            start_percentage,
            seen: Vec::new(),
        }
    }

    fn optimistic_gain(&self) -> f64 {
        let unseen: Vec<usize> = self
            .parent
            .iter()
            .zip(&self.seen_counts)
            .map(|(p, s)| p.saturating_sub(*s))
            .collect();
        let open: Vec<usize> = (0..unseen.len()).filter(|&c| unseen[c] > 0).collect();
        if open.len() > MAX_ENUMERATED_CLASSES {
            return self.parent_entropy;
        }

        let mut best = f64::NEG_INFINITY;
        let mut left = vec![0usize; self.parent.len()];
        let mut trial = left.clone();
        for k in 0..=self.seen.len() {
            let at_boundary =
                k == 0 || k == self.seen.len() || self.seen[k - 1].distance != self.seen[k].distance;
            if at_boundary {
                for mask in 0u32..(1 << open.len()) {
                    trial.copy_from_slice(&left);
                    for (bit, &class) in open.iter().enumerate() {
                        if mask & (1 << bit) != 0 {
                            trial[class] += unseen[class];
                        }
                    }
                    best = best.max(split_gain(&self.parent, self.parent_entropy, &trial));
                }
            }
            if let Some(entry) = self.seen.get(k) {
                left[entry.class] += 1;
            }
        }
        best
    }
}

impl QualityBound for InformationGainBound {
    fn update(&mut self, entry: OrderLineEntry) {
        if entry.class >= self.parent.len() {
            return;
        }
        let at = self.seen.partition_point(|e| e.distance <= entry.distance);
        self.seen.insert(at, entry);
        self.seen_counts[entry.class] += 1;
    }

    fn should_prune(&self, best_so_far: f64) -> bool {
        let n_classes = self.parent.len().max(1);
        let total: usize = self.parent.iter().sum();
        if total == 0 || self.seen.len() % n_classes != 0 {
            return false;
        }
        let seen_percentage = self.seen.len() as f64 / total as f64 * 100.0;
        if seen_percentage < self.start_percentage {
            return false;
        }
        // A tie on quality can still win on the ranking's tie-breaks.
        self.optimistic_gain() < best_so_far
    }
}
