//! The discovery loop: visit series, score their candidates, keep the best.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sieve_distance::min_distance;
use tracing::{debug, info, instrument, warn};

use crate::checkpoint::save_checkpoint;
use crate::config::{ClassValueMode, ShapeletConfig};
use crate::dataset::{Dataset, LabeledSeries};
use crate::error::ShapeletError;
use crate::merge::{BestShapelets, MergeRules};
use crate::pruning::remove_self_similar;
use crate::quality::{ClassCounts, OrderLineEntry};
use crate::reorder::round_robin_order;
use crate::result::{DiscoveryResult, DiscoveryStats};
use crate::search::ChannelMode;
use crate::shapelet::{Candidate, Shapelet};
use crate::transform::ShapeletTransform;

/// Everything needed to continue a discovery where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SearchState {
    /// Position in the visit order of the next series to search.
    pub(crate) cases_so_far: usize,
    /// Zero-based pass over the data.
    pub(crate) pass: usize,
    /// Time spent in earlier sessions and this one so far.
    pub(crate) elapsed_ms: u64,
    pub(crate) best: BestShapelets,
    pub(crate) stats: DiscoveryStats,
}

impl SearchState {
    pub(crate) fn fresh(config: &ShapeletConfig, data: &Dataset) -> Self {
        let best = if config.balanced {
            BestShapelets::balanced(config.k, data.n_classes())
        } else {
            BestShapelets::global(config.k)
        };
        Self {
            cases_so_far: 0,
            pass: 0,
            elapsed_ms: 0,
            best,
            stats: DiscoveryStats {
                passes: 1,
                ..DiscoveryStats::default()
            },
        }
    }
}

/// Outcome of scoring one candidate.
enum Evaluation {
    Scored(Shapelet),
    Pruned,
}

/// Scores candidates against the whole training set.
struct Scorer<'a> {
    config: &'a ShapeletConfig,
    data: &'a Dataset,
    class_counts: Vec<usize>,
}

impl Scorer<'_> {
    /// Channels a candidate reads: `(first, count)`.
    fn channels(&self, candidate: &Candidate) -> (usize, usize) {
        match self.config.channel_mode {
            ChannelMode::Independent => (candidate.dimension, 1),
            ChannelMode::Dependent => (0, self.data.n_channels()),
        }
    }

    /// Order-line class of a series with `label`, for a candidate of `source_class`.
    fn order_line_class(&self, label: usize, source_class: usize) -> usize {
        match self.config.class_value_mode {
            ClassValueMode::Normal => label,
            ClassValueMode::Binary => usize::from(label != source_class),
        }
    }

    /// Class totals of the order-line, which never contains the source series.
    fn order_line_counts(&self, source_class: usize) -> ClassCounts {
        let mut counts = match self.config.class_value_mode {
            ClassValueMode::Normal => self.class_counts.clone(),
            ClassValueMode::Binary => {
                let same = self.class_counts[source_class];
                vec![same, self.data.len() - same]
            }
        };
        counts[self.order_line_class(source_class, source_class)] -= 1;
        ClassCounts::new(counts)
    }

    fn evaluate(&self, candidate: Candidate, worst: Option<f64>) -> Evaluation {
        let metric = self.config.distance.as_ref();
        let source = &self.data.series()[candidate.series_id];
        let source_class = source.label();
        let (first, count) = self.channels(&candidate);
        let end = candidate.start + candidate.length;
        let content: Vec<Vec<f64>> = source
            .channel_slices(first, count)
            .iter()
            .map(|c| metric.prepare(&c[candidate.start..end]))
            .collect();

        let counts = self.order_line_counts(source_class);
        let entry_for = |s: &LabeledSeries| {
            let d = min_distance(metric, &content, &s.channel_slices(first, count), f64::INFINITY);
            OrderLineEntry::new(d, self.order_line_class(s.label(), source_class))
        };
        let others = self
            .data
            .series()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != candidate.series_id);

        let order_line: Vec<OrderLineEntry> = if self.config.parallel_scoring {
            self.data
                .series()
                .par_iter()
                .enumerate()
                .filter(|(i, _)| *i != candidate.series_id)
                .map(|(_, s)| entry_for(s))
                .collect()
        } else {
            let mut bound = match worst {
                Some(_) if self.config.candidate_pruning => self
                    .config
                    .quality
                    .bound(&counts, self.config.start_percentage),
                _ => None,
            };
            let mut order_line = Vec::with_capacity(self.data.len() - 1);
            for (_, s) in others {
                let entry = entry_for(s);
                order_line.push(entry);
                if let Some(b) = bound.as_mut()
                    && let Some(w) = worst
                {
                    b.update(entry);
                    if b.should_prune(w) {
                        return Evaluation::Pruned;
                    }
                }
            }
            order_line
        };

        let score = self.config.quality.score(&order_line, &counts);
        Evaluation::Scored(Shapelet::new(candidate, source_class, score, content))
    }
}

/// Run discovery from `state` until every series is visited or the contract expires.
#[instrument(skip_all, fields(n_series = data.len(), k = config.k, resume_at = state.cases_so_far))]
pub(crate) fn run(
    config: &ShapeletConfig,
    data: &Dataset,
    mut state: SearchState,
) -> Result<DiscoveryResult, ShapeletError> {
    let visit_order: Vec<usize> = if config.round_robin {
        round_robin_order(&data.labels(), data.n_classes())
    } else {
        (0..data.len()).collect()
    };
    let search = config.candidate_search();
    let exhaustive = data
        .series()
        .iter()
        .all(|s| search.covers_space(s.len(), s.n_channels()));
    let scorer = Scorer {
        config,
        data,
        class_counts: data.class_counts(),
    };
    let rules = MergeRules {
        order: config.order,
        prune_matching: config.prune_matching,
        guard_self_similar: config.remove_self_similar,
        metric: config.distance.as_ref(),
    };

    let started = Instant::now();
    let carried_ms = state.elapsed_ms;
    let elapsed_ms = || carried_ms + started.elapsed().as_millis() as u64;
    let contract_ms = config.contract.map(|c| c.as_millis() as u64);

    info!(
        n_series = data.len(),
        n_classes = data.n_classes(),
        distance = config.distance.name(),
        quality = config.quality.name(),
        exhaustive,
        "starting shapelet discovery"
    );

    'passes: loop {
        while state.cases_so_far < visit_order.len() {
            if let Some(limit) = contract_ms
                && elapsed_ms() >= limit
            {
                state.stats.contract_expired = true;
                info!(
                    pass = state.pass,
                    cases_so_far = state.cases_so_far,
                    "contract expired"
                );
                break 'passes;
            }

            let position = visit_order[state.cases_so_far];
            let series = &data.series()[position];
            // Merging may drop retained shapelets that overlap or match new
            // ones, and the worst quality could then fall below the bound.
            let may_evict = config.prune_matching
                || (config.remove_self_similar && state.best.holds_series(position));
            let worst = if may_evict {
                None
            } else {
                state.best.worst_quality(series.label())
            };

            let mut evaluated = 0u64;
            let mut pruned = 0u64;
            let mut found = search.search_in_series(
                position,
                series.len(),
                series.n_channels(),
                state.pass,
                |candidate| {
                    evaluated += 1;
                    match scorer.evaluate(candidate, worst) {
                        Evaluation::Scored(s) => Some(s),
                        Evaluation::Pruned => {
                            pruned += 1;
                            None
                        }
                    }
                },
            );

            config.order.sort(&mut found);
            if config.remove_self_similar {
                found = remove_self_similar(found);
            }
            debug!(
                series = position,
                class = series.label(),
                evaluated,
                pruned,
                kept = found.len(),
                "series searched"
            );
            state.best.merge(series.label(), found, &rules);

            state.stats.candidates_evaluated += evaluated;
            state.stats.candidates_pruned += pruned;
            state.stats.series_processed += 1;
            state.cases_so_far += 1;
            state.elapsed_ms = elapsed_ms();

            if let Some(path) = config.checkpoint.as_deref()
                && let Err(e) = save_checkpoint(path, config, data, &state)
            {
                warn!(error = %e, "checkpoint write failed, continuing in memory");
            }
        }

        let time_left = contract_ms.is_some_and(|limit| elapsed_ms() < limit);
        if exhaustive || !time_left {
            break;
        }
        state.pass += 1;
        state.cases_so_far = 0;
        state.stats.passes += 1;
        info!(pass = state.pass, "pass complete with contract time left, rescanning");
    }

    state.elapsed_ms = elapsed_ms();
    state.stats.elapsed_ms = state.elapsed_ms;
    state.stats.shapelet_count = state.best.len();

    info!(
        shapelets = state.stats.shapelet_count,
        series_processed = state.stats.series_processed,
        candidates_evaluated = state.stats.candidates_evaluated,
        candidates_pruned = state.stats.candidates_pruned,
        elapsed_ms = state.stats.elapsed_ms,
        contract_expired = state.stats.contract_expired,
        "shapelet discovery complete"
    );

    let transform = ShapeletTransform::new(state.best.into_shapelets(), config.distance.clone());
    Ok(DiscoveryResult::new(transform, state.stats))
}
