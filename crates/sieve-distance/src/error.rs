//! Error types for series validation and distance construction.

/// Errors from time series validation and distance configuration.
#[derive(Debug, thiserror::Error)]
pub enum DistanceError {
    /// Returned when an empty slice is provided as a time series.
    #[error("time series must be non-empty")]
    EmptySeries,

    /// Returned when a time series contains NaN, infinity, or negative infinity.
    #[error("time series contains non-finite value at index {index}")]
    NonFiniteValue {
        /// Position of the first non-finite value found.
        index: usize,
    },

    /// Returned when the MSM split/merge cost is negative or not finite.
    #[error("MSM cost must be finite and non-negative, got {cost}")]
    InvalidCost {
        /// The rejected cost value.
        cost: f64,
    },

    /// Returned when a registry lookup names a distance that was never registered.
    #[error("unknown distance \"{name}\" (available: {available})")]
    UnknownDistance {
        /// The requested name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },
}
