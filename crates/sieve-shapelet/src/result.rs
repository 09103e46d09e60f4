//! Discovery output.

use serde::{Deserialize, Serialize};

use crate::shapelet::Shapelet;
use crate::transform::ShapeletTransform;

/// Counters describing one discovery run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    /// Series searched, summed over passes and resumed sessions.
    pub series_processed: usize,
    /// Passes started over the data.
    pub passes: usize,
    /// Candidates enumerated.
    pub candidates_evaluated: u64,
    /// Candidates abandoned by the quality bound.
    pub candidates_pruned: u64,
    /// Wall-clock time, including time before a resume.
    pub elapsed_ms: u64,
    /// Whether the time contract stopped the search.
    pub contract_expired: bool,
    /// Shapelets retained.
    pub shapelet_count: usize,
}

/// Result of shapelet discovery: the frozen transform and run statistics.
#[derive(Debug, Clone)]
pub struct DiscoveryResult {
    transform: ShapeletTransform,
    stats: DiscoveryStats,
}

impl DiscoveryResult {
    pub(crate) fn new(transform: ShapeletTransform, stats: DiscoveryStats) -> Self {
        Self { transform, stats }
    }

    /// Borrow the discovered transform.
    #[must_use]
    pub fn transform(&self) -> &ShapeletTransform {
        &self.transform
    }

    /// Consume the result and return the transform.
    #[must_use]
    pub fn into_transform(self) -> ShapeletTransform {
        self.transform
    }

    /// Borrow the retained shapelets.
    #[must_use]
    pub fn shapelets(&self) -> &[Shapelet] {
        self.transform.shapelets()
    }

    /// Return run statistics.
    #[must_use]
    pub fn stats(&self) -> &DiscoveryStats {
        &self.stats
    }
}
