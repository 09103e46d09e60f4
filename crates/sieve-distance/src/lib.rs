//! Distances for shapelet discovery.
//!
//! Pure math library with zero I/O. Provides validated series channels,
//! z-normalisation, sliding-window subsequence distances with early
//! abandoning, the Move-Split-Merge elastic distance with an optional
//! Sakoe-Chiba band, pairwise distance matrices, and a registry that builds
//! distances by name.

mod constraint;
mod distance;
mod error;
mod matrix;
mod msm;
mod normalize;
mod registry;
mod series;
mod subsequence;

pub use constraint::BandConstraint;
pub use distance::MsmDistance;
pub use error::DistanceError;
pub use matrix::DistanceMatrix;
pub use msm::Msm;
pub use normalize::{ZERO_VARIANCE_STD, mean_std, z_normalize};
pub use registry::{DistanceFactory, DistanceParams, DistanceRegistry};
pub use series::{TimeSeries, TimeSeriesView};
pub use subsequence::{
    Euclidean, MsmSubsequence, SubsequenceDistance, ZNormEuclidean, min_distance,
};
