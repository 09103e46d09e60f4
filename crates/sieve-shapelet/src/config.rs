//! Configuration builder for shapelet discovery.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sieve_distance::{SubsequenceDistance, ZNormEuclidean};

use crate::checkpoint::load_checkpoint;
use crate::dataset::Dataset;
use crate::engine;
use crate::error::ShapeletError;
use crate::info_gain::InformationGain;
use crate::quality::QualityMeasure;
use crate::result::DiscoveryResult;
use crate::search::{CandidateSearch, ChannelMode, SearchType};
use crate::shapelet::ShapeletOrder;

/// Which labels the order-line carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassValueMode {
    /// The dataset's classes.
    #[default]
    Normal,
    /// One-vs-all: 0 for the candidate's own class, 1 for every other class.
    Binary,
}

/// Configuration for shapelet discovery.
///
/// Construct via [`ShapeletConfig::new`], then chain `with_*` methods.
///
/// # Defaults
///
/// | Parameter              | Default            |
/// |------------------------|--------------------|
/// | `search_type`          | `Full`             |
/// | `length_increment`     | 1                  |
/// | `position_increment`   | 1                  |
/// | `order`                | `SeparationGap`    |
/// | `class_value_mode`     | `Normal`           |
/// | `channel_mode`         | `Independent`      |
/// | `remove_self_similar`  | `true`             |
/// | `prune_matching`       | `false`            |
/// | `candidate_pruning`    | `true`             |
/// | `start_percentage`     | 10.0               |
/// | `balanced`             | `false`            |
/// | `round_robin`          | `false`            |
/// | `parallel_scoring`     | `false`            |
/// | `contract`             | `None`             |
/// | `checkpoint`           | `None`             |
/// | `seed`                 | 42                 |
/// | `distance`             | `ZNormEuclidean`   |
/// | `quality`              | `InformationGain`  |
#[derive(Debug, Clone)]
pub struct ShapeletConfig {
    pub(crate) k: usize,
    pub(crate) min_length: usize,
    pub(crate) max_length: usize,
    pub(crate) length_increment: usize,
    pub(crate) position_increment: usize,
    pub(crate) search_type: SearchType,
    pub(crate) order: ShapeletOrder,
    pub(crate) class_value_mode: ClassValueMode,
    pub(crate) channel_mode: ChannelMode,
    pub(crate) remove_self_similar: bool,
    pub(crate) prune_matching: bool,
    pub(crate) candidate_pruning: bool,
    pub(crate) start_percentage: f64,
    pub(crate) balanced: bool,
    pub(crate) round_robin: bool,
    pub(crate) parallel_scoring: bool,
    pub(crate) contract: Option<Duration>,
    pub(crate) checkpoint: Option<PathBuf>,
    pub(crate) seed: u64,
    pub(crate) distance: Arc<dyn SubsequenceDistance>,
    pub(crate) quality: Arc<dyn QualityMeasure>,
}

impl ShapeletConfig {
    /// Create a config keeping `k` shapelets of length `min_length..=max_length`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::InvalidK`] | `k` is zero |
    /// | [`ShapeletError::InvalidMinLength`] | `min_length` is zero |
    /// | [`ShapeletError::InvalidLengthRange`] | `min_length > max_length` |
    pub fn new(k: usize, min_length: usize, max_length: usize) -> Result<Self, ShapeletError> {
        if k == 0 {
            return Err(ShapeletError::InvalidK { k });
        }
        if min_length == 0 {
            return Err(ShapeletError::InvalidMinLength { min_length });
        }
        if min_length > max_length {
            return Err(ShapeletError::InvalidLengthRange {
                min_length,
                max_length,
            });
        }
        Ok(Self {
            k,
            min_length,
            max_length,
            length_increment: 1,
            position_increment: 1,
            search_type: SearchType::Full,
            order: ShapeletOrder::SeparationGap,
            class_value_mode: ClassValueMode::Normal,
            channel_mode: ChannelMode::Independent,
            remove_self_similar: true,
            prune_matching: false,
            candidate_pruning: true,
            start_percentage: 10.0,
            balanced: false,
            round_robin: false,
            parallel_scoring: false,
            contract: None,
            checkpoint: None,
            seed: 42,
            distance: Arc::new(ZNormEuclidean),
            quality: Arc::new(InformationGain),
        })
    }

    // --- Setters ---

    /// Set the candidate search type.
    #[must_use]
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Step between candidate lengths.
    #[must_use]
    pub fn with_length_increment(mut self, length_increment: usize) -> Self {
        self.length_increment = length_increment;
        self
    }

    /// Step between candidate start positions.
    #[must_use]
    pub fn with_position_increment(mut self, position_increment: usize) -> Self {
        self.position_increment = position_increment;
        self
    }

    /// Set the shapelet ranking.
    #[must_use]
    pub fn with_order(mut self, order: ShapeletOrder) -> Self {
        self.order = order;
        self
    }

    /// Set the order-line labelling.
    #[must_use]
    pub fn with_class_value_mode(mut self, class_value_mode: ClassValueMode) -> Self {
        self.class_value_mode = class_value_mode;
        self
    }

    /// Set how candidates use channels.
    #[must_use]
    pub fn with_channel_mode(mut self, channel_mode: ChannelMode) -> Self {
        self.channel_mode = channel_mode;
        self
    }

    /// Remove overlapping candidates from the same series.
    #[must_use]
    pub fn with_remove_self_similar(mut self, remove_self_similar: bool) -> Self {
        self.remove_self_similar = remove_self_similar;
        self
    }

    /// Skip near-identical shapelets that tie on the ranking keys.
    #[must_use]
    pub fn with_prune_matching(mut self, prune_matching: bool) -> Self {
        self.prune_matching = prune_matching;
        self
    }

    /// Abandon candidates whose quality bound cannot beat the worst retained shapelet.
    #[must_use]
    pub fn with_candidate_pruning(mut self, candidate_pruning: bool) -> Self {
        self.candidate_pruning = candidate_pruning;
        self
    }

    /// Percentage of the order-line to see before the bound may prune.
    #[must_use]
    pub fn with_start_percentage(mut self, start_percentage: f64) -> Self {
        self.start_percentage = start_percentage;
        self
    }

    /// Keep `k / n_classes` shapelets per class.
    #[must_use]
    pub fn with_balanced(mut self, balanced: bool) -> Self {
        self.balanced = balanced;
        self
    }

    /// Visit series interleaved by class.
    #[must_use]
    pub fn with_round_robin(mut self, round_robin: bool) -> Self {
        self.round_robin = round_robin;
        self
    }

    /// Compute each order-line in parallel. Disables candidate pruning.
    #[must_use]
    pub fn with_parallel_scoring(mut self, parallel_scoring: bool) -> Self {
        self.parallel_scoring = parallel_scoring;
        self
    }

    /// Stop discovery after `contract` wall-clock time. `None` means no limit.
    #[must_use]
    pub fn with_contract(mut self, contract: Option<Duration>) -> Self {
        self.contract = contract;
        self
    }

    /// Write a checkpoint to `path` after every series.
    #[must_use]
    pub fn with_checkpoint(mut self, path: Option<PathBuf>) -> Self {
        self.checkpoint = path;
        self
    }

    /// Set the random seed for reproducibility.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the subsequence distance.
    #[must_use]
    pub fn with_distance(mut self, distance: Arc<dyn SubsequenceDistance>) -> Self {
        self.distance = distance;
        self
    }

    /// Set the quality measure.
    #[must_use]
    pub fn with_quality(mut self, quality: Arc<dyn QualityMeasure>) -> Self {
        self.quality = quality;
        self
    }

    // --- Getters ---

    /// Return the number of shapelets to keep.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Return the shortest candidate length.
    #[must_use]
    pub fn min_length(&self) -> usize {
        self.min_length
    }

    /// Return the longest candidate length.
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Return the length increment.
    #[must_use]
    pub fn length_increment(&self) -> usize {
        self.length_increment
    }

    /// Return the position increment.
    #[must_use]
    pub fn position_increment(&self) -> usize {
        self.position_increment
    }

    /// Return the search type.
    #[must_use]
    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    /// Return the shapelet ranking.
    #[must_use]
    pub fn order(&self) -> ShapeletOrder {
        self.order
    }

    /// Return the order-line labelling.
    #[must_use]
    pub fn class_value_mode(&self) -> ClassValueMode {
        self.class_value_mode
    }

    /// Return the channel mode.
    #[must_use]
    pub fn channel_mode(&self) -> ChannelMode {
        self.channel_mode
    }

    /// Return whether self-similar candidates are removed.
    #[must_use]
    pub fn remove_self_similar(&self) -> bool {
        self.remove_self_similar
    }

    /// Return whether matching shapelets are pruned while merging.
    #[must_use]
    pub fn prune_matching(&self) -> bool {
        self.prune_matching
    }

    /// Return whether the quality bound may abandon candidates.
    #[must_use]
    pub fn candidate_pruning(&self) -> bool {
        self.candidate_pruning
    }

    /// Return the pruning start percentage.
    #[must_use]
    pub fn start_percentage(&self) -> f64 {
        self.start_percentage
    }

    /// Return whether discovery is class-balanced.
    #[must_use]
    pub fn balanced(&self) -> bool {
        self.balanced
    }

    /// Return whether series are visited round-robin by class.
    #[must_use]
    pub fn round_robin(&self) -> bool {
        self.round_robin
    }

    /// Return whether order-lines are computed in parallel.
    #[must_use]
    pub fn parallel_scoring(&self) -> bool {
        self.parallel_scoring
    }

    /// Return the time contract, if any.
    #[must_use]
    pub fn contract(&self) -> Option<Duration> {
        self.contract
    }

    /// Return the checkpoint path, if any.
    #[must_use]
    pub fn checkpoint(&self) -> Option<&Path> {
        self.checkpoint.as_deref()
    }

    /// Return the random seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Return the subsequence distance.
    #[must_use]
    pub fn distance(&self) -> &Arc<dyn SubsequenceDistance> {
        &self.distance
    }

    /// Return the quality measure.
    #[must_use]
    pub fn quality(&self) -> &Arc<dyn QualityMeasure> {
        &self.quality
    }

    /// The candidate enumerator this configuration describes.
    pub(crate) fn candidate_search(&self) -> CandidateSearch {
        CandidateSearch::new(self.min_length, self.max_length)
            .with_search_type(self.search_type)
            .with_length_increment(self.length_increment)
            .with_position_increment(self.position_increment)
            .with_channel_mode(self.channel_mode)
            .with_seed(self.seed)
    }

    /// Checks that need the dataset or span several fields.
    fn validate(&self, data: &Dataset) -> Result<(), ShapeletError> {
        if self.length_increment == 0 {
            return Err(ShapeletError::InvalidIncrement {
                which: "length",
                value: self.length_increment,
            });
        }
        if self.position_increment == 0 {
            return Err(ShapeletError::InvalidIncrement {
                which: "position",
                value: self.position_increment,
            });
        }
        if !(0.0..=100.0).contains(&self.start_percentage) {
            return Err(ShapeletError::InvalidStartPercentage {
                start_percentage: self.start_percentage,
            });
        }
        if let SearchType::Random { per_series: 0 } = self.search_type {
            return Err(ShapeletError::InvalidSeriesBudget { per_series: 0 });
        }
        if data.len() < 2 {
            return Err(ShapeletError::TooFewSeries {
                n_series: data.len(),
            });
        }
        if self.balanced && self.k < data.n_classes() {
            return Err(ShapeletError::InvalidBalancedK {
                k: self.k,
                n_classes: data.n_classes(),
            });
        }
        let longest = data.max_len();
        if longest < self.min_length {
            return Err(ShapeletError::NoSeriesLongEnough {
                min_length: self.min_length,
                longest,
            });
        }
        Ok(())
    }

    /// Discover shapelets in `data`.
    ///
    /// Returns a frozen transform; further data is only projected onto it.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::InvalidIncrement`] | a length or position increment is zero |
    /// | [`ShapeletError::InvalidStartPercentage`] | `start_percentage` is outside [0, 100] |
    /// | [`ShapeletError::InvalidSeriesBudget`] | random search with zero candidates per series |
    /// | [`ShapeletError::TooFewSeries`] | fewer than two series |
    /// | [`ShapeletError::InvalidBalancedK`] | balanced with `k` below the class count |
    /// | [`ShapeletError::NoSeriesLongEnough`] | every series is shorter than `min_length` |
    ///
    /// Checkpoint write failures are logged and do not fail discovery.
    pub fn discover(&self, data: &Dataset) -> Result<DiscoveryResult, ShapeletError> {
        self.validate(data)?;
        engine::run(self, data, engine::SearchState::fresh(self, data))
    }

    /// Continue a discovery from the checkpoint at `path`.
    ///
    /// # Errors
    ///
    /// Every error of [`discover`][Self::discover], plus:
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::ReadCheckpoint`] | file read failed |
    /// | [`ShapeletError::DeserializeCheckpoint`] | bincode decoding failed |
    /// | [`ShapeletError::IncompatibleCheckpointVersion`] | format version mismatch |
    /// | [`ShapeletError::ResumeMismatch`] | the checkpoint belongs to another dataset or configuration |
    pub fn resume(
        &self,
        data: &Dataset,
        path: impl AsRef<Path>,
    ) -> Result<DiscoveryResult, ShapeletError> {
        self.validate(data)?;
        let state = load_checkpoint(path.as_ref(), self, data)?;
        engine::run(self, data, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_eagerly() {
        assert!(matches!(ShapeletConfig::new(0, 3, 5), Err(ShapeletError::InvalidK { k: 0 })));
        assert!(matches!(
            ShapeletConfig::new(5, 0, 5),
            Err(ShapeletError::InvalidMinLength { .. })
        ));
        assert!(matches!(
            ShapeletConfig::new(5, 6, 5),
            Err(ShapeletError::InvalidLengthRange {
                min_length: 6,
                max_length: 5
            })
        ));
    }

    #[test]
    fn defaults_match_table() {
        let c = ShapeletConfig::new(10, 3, 20).unwrap();
        assert_eq!(c.search_type(), SearchType::Full);
        assert_eq!(c.order(), ShapeletOrder::SeparationGap);
        assert!(c.remove_self_similar());
        assert!(!c.prune_matching());
        assert!(c.candidate_pruning());
        assert_eq!(c.start_percentage(), 10.0);
        assert_eq!(c.seed(), 42);
        assert_eq!(c.distance().name(), "znorm-euclidean");
        assert_eq!(c.quality().name(), "information-gain");
        assert!(c.contract().is_none());
        assert!(c.checkpoint().is_none());
    }
}
