use std::path::PathBuf;

use sieve_distance::DistanceError;

/// Errors from shapelet discovery, projection and persistence.
#[derive(Debug, thiserror::Error)]
pub enum ShapeletError {
    /// Returned when k is zero.
    #[error("k must be at least 1, got {k}")]
    InvalidK {
        /// The invalid k value provided.
        k: usize,
    },

    /// Returned when min_length is zero.
    #[error("min_length must be at least 1, got {min_length}")]
    InvalidMinLength {
        /// The invalid min_length value provided.
        min_length: usize,
    },

    /// Returned when min_length exceeds max_length.
    #[error("min_length ({min_length}) must not exceed max_length ({max_length})")]
    InvalidLengthRange {
        /// Shortest candidate length requested.
        min_length: usize,
        /// Longest candidate length requested.
        max_length: usize,
    },

    /// Returned when a length or position increment is zero.
    #[error("{which} increment must be at least 1, got {value}")]
    InvalidIncrement {
        /// Which increment was invalid (`length` or `position`).
        which: &'static str,
        /// The invalid increment value.
        value: usize,
    },

    /// Returned when the pruning start percentage is outside [0, 100].
    #[error("start_percentage must be in [0, 100], got {start_percentage}")]
    InvalidStartPercentage {
        /// The invalid percentage provided.
        start_percentage: f64,
    },

    /// Returned when a random search is asked to draw zero candidates per series.
    #[error("random search needs at least 1 candidate per series, got {per_series}")]
    InvalidSeriesBudget {
        /// The invalid per-series budget.
        per_series: usize,
    },

    /// Returned when class-balanced discovery cannot give every class a slot.
    #[error("class-balanced discovery needs k >= number of classes, got k = {k} for {n_classes} classes")]
    InvalidBalancedK {
        /// The configured k.
        k: usize,
        /// The number of classes in the dataset.
        n_classes: usize,
    },

    /// Returned when the dataset has no series.
    #[error("dataset has zero series")]
    EmptyDataset,

    /// Returned when discovery is given fewer than two series.
    #[error("discovery needs at least 2 series to build an order-line, got {n_series}")]
    TooFewSeries {
        /// The number of series provided.
        n_series: usize,
    },

    /// Returned when a series has no channels.
    #[error("series {series_index} has no channels")]
    EmptySeries {
        /// Zero-based index of the offending series.
        series_index: usize,
    },

    /// Returned when a series has a different number of channels than the first.
    #[error("series {series_index} has {got} channels, expected {expected}")]
    ChannelMismatch {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// Channel count of the first series.
        expected: usize,
        /// Channel count of the offending series.
        got: usize,
    },

    /// Returned when the channels of one series differ in length.
    #[error("series {series_index} channel {channel} has length {got}, expected {expected}")]
    ChannelLengthMismatch {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// Zero-based index of the offending channel.
        channel: usize,
        /// Length of channel 0.
        expected: usize,
        /// Length of the offending channel.
        got: usize,
    },

    /// Returned when a class label is not below the declared class count.
    #[error("series {series_index} has label {label}, but only {n_classes} classes are declared")]
    LabelOutOfRange {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// The offending label.
        label: usize,
        /// The declared number of classes.
        n_classes: usize,
    },

    /// Returned when no series is long enough to hold a candidate.
    #[error("no series reaches min_length {min_length} (longest is {longest})")]
    NoSeriesLongEnough {
        /// Shortest candidate length requested.
        min_length: usize,
        /// Length of the longest series.
        longest: usize,
    },

    /// Returned when a shapelet needs a channel the series does not have.
    #[error("series {series_index} has {channels} channels, shapelet needs channel {dimension}")]
    MissingChannel {
        /// Zero-based index of the offending series.
        series_index: usize,
        /// Highest channel index the shapelet reads.
        dimension: usize,
        /// Channel count of the offending series.
        channels: usize,
    },

    /// Returned when a quality measure name is not registered.
    #[error("unknown quality measure '{name}' (available: {available})")]
    UnknownQuality {
        /// The requested name.
        name: String,
        /// Comma-separated registered names.
        available: String,
    },

    /// Returned when building a distance fails.
    #[error(transparent)]
    Distance(#[from] DistanceError),

    /// Returned when checkpoint serialization fails.
    #[error("failed to serialize checkpoint")]
    SerializeCheckpoint {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when writing the checkpoint file fails.
    #[error("failed to write checkpoint to {path}")]
    WriteCheckpoint {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the checkpoint file fails.
    #[error("failed to read checkpoint from {path}")]
    ReadCheckpoint {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when checkpoint deserialization fails.
    #[error("failed to deserialize checkpoint from {path}")]
    DeserializeCheckpoint {
        /// Path to the checkpoint that could not be decoded.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when a checkpoint has an incompatible format version.
    #[error("incompatible checkpoint version in {path}: expected {expected}, found {found}")]
    IncompatibleCheckpointVersion {
        /// The checkpoint format version this build expects.
        expected: u32,
        /// The checkpoint format version found in the file.
        found: u32,
        /// Path to the checkpoint with the incompatible version.
        path: PathBuf,
    },

    /// Returned when a checkpoint was written for another dataset or configuration.
    #[error("refusing to resume from {path}: {reason}")]
    ResumeMismatch {
        /// Path to the checkpoint.
        path: PathBuf,
        /// What differs.
        reason: String,
    },

    /// Returned when writing the shapelet log fails.
    #[error("failed to write shapelet log to {path}")]
    WriteLog {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// Returned when reading the shapelet log fails.
    #[error("failed to read shapelet log from {path}")]
    ReadLog {
        /// Path to the log file.
        path: PathBuf,
        /// The underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a shapelet log record is malformed.
    #[error("malformed shapelet log {path} at line {line}: {reason}")]
    ParseLog {
        /// Path to the log file.
        path: PathBuf,
        /// One-based line number of the offending record.
        line: u64,
        /// Human-readable description of the problem.
        reason: String,
    },
}
