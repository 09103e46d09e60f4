//! Shapelet discovery and the shapelet transform.
//!
//! Searches labelled training series for the `k` subsequences whose
//! distances best separate the classes, then projects any series onto those
//! shapelets to produce one feature per shapelet. Discovery supports full and
//! seeded random search, information-gain pruning with an admissible bound,
//! class-balanced retention, time contracts with resumable checkpoints, and a
//! CSV shapelet log that rebuilds a transform without rediscovery.

mod checkpoint;
mod config;
mod dataset;
mod engine;
mod error;
mod f_stat;
mod info_gain;
mod log;
mod merge;
mod pruning;
mod quality;
mod reorder;
mod result;
mod search;
mod shapelet;
mod timing;
mod transform;

pub use config::{ClassValueMode, ShapeletConfig};
pub use dataset::{Dataset, LabeledSeries};
pub use error::ShapeletError;
pub use f_stat::FStat;
pub use info_gain::InformationGain;
pub use merge::{BestShapelets, MergeRules, combine};
pub use pruning::{MATCH_TOLERANCE, contains_matching_shapelet, remove_self_similar};
pub use quality::{
    ClassCounts, OrderLineEntry, QualityBound, QualityFactory, QualityMeasure, QualityRegistry,
    Score,
};
pub use reorder::round_robin_order;
pub use result::{DiscoveryResult, DiscoveryStats};
pub use search::{CandidateSearch, ChannelMode, SearchType};
pub use shapelet::{Candidate, Shapelet, ShapeletOrder};
pub use timing::{
    NANOS_PER_OPERATION, count_candidates, count_candidates_with_skipping, estimate_operations,
    per_series_budget,
};
pub use transform::{ShapeletTransform, TransformedTable};
