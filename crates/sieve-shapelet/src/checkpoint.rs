//! Versioned bincode checkpoints of an in-progress discovery.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::config::{ClassValueMode, ShapeletConfig};
use crate::dataset::Dataset;
use crate::engine::SearchState;
use crate::error::ShapeletError;
use crate::search::{ChannelMode, SearchType};
use crate::shapelet::ShapeletOrder;

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// Every configuration field that changes which shapelets are found.
///
/// The contract and checkpoint path are left out: a run may be resumed
/// with a different time budget or checkpoint location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ConfigFingerprint {
    k: usize,
    min_length: usize,
    max_length: usize,
    length_increment: usize,
    position_increment: usize,
    search_type: SearchType,
    order: ShapeletOrder,
    class_value_mode: ClassValueMode,
    channel_mode: ChannelMode,
    remove_self_similar: bool,
    prune_matching: bool,
    candidate_pruning: bool,
    start_percentage: f64,
    balanced: bool,
    round_robin: bool,
    parallel_scoring: bool,
    seed: u64,
    distance: String,
    quality: String,
}

impl ConfigFingerprint {
    fn of(config: &ShapeletConfig) -> Self {
        Self {
            k: config.k,
            min_length: config.min_length,
            max_length: config.max_length,
            length_increment: config.length_increment,
            position_increment: config.position_increment,
            search_type: config.search_type,
            order: config.order,
            class_value_mode: config.class_value_mode,
            channel_mode: config.channel_mode,
            remove_self_similar: config.remove_self_similar,
            prune_matching: config.prune_matching,
            candidate_pruning: config.candidate_pruning,
            start_percentage: config.start_percentage,
            balanced: config.balanced,
            round_robin: config.round_robin,
            parallel_scoring: config.parallel_scoring,
            seed: config.seed,
            distance: config.distance.descriptor(),
            quality: config.quality.name().to_string(),
        }
    }

    fn differing_fields(&self, other: &Self) -> Vec<&'static str> {
        let checks = [
            ("k", self.k == other.k),
            ("min_length", self.min_length == other.min_length),
            ("max_length", self.max_length == other.max_length),
            ("length_increment", self.length_increment == other.length_increment),
            ("position_increment", self.position_increment == other.position_increment),
            ("search_type", self.search_type == other.search_type),
            ("order", self.order == other.order),
            ("class_value_mode", self.class_value_mode == other.class_value_mode),
            ("channel_mode", self.channel_mode == other.channel_mode),
            ("remove_self_similar", self.remove_self_similar == other.remove_self_similar),
            ("prune_matching", self.prune_matching == other.prune_matching),
            ("candidate_pruning", self.candidate_pruning == other.candidate_pruning),
            ("start_percentage", self.start_percentage == other.start_percentage),
            ("balanced", self.balanced == other.balanced),
            ("round_robin", self.round_robin == other.round_robin),
            ("parallel_scoring", self.parallel_scoring == other.parallel_scoring),
            ("seed", self.seed == other.seed),
            ("distance", self.distance == other.distance),
            ("quality", self.quality == other.quality),
        ];
        checks
            .iter()
            .filter(|(_, same)| !same)
            .map(|(name, _)| *name)
            .collect()
    }
}

/// Versioned envelope around the search state.
#[derive(Serialize, Deserialize)]
struct CheckpointEnvelope<S> {
    /// Format version for compatibility checking.
    format_version: u32,
    /// Configuration that produced the state.
    config: ConfigFingerprint,
    /// Hash of the training data.
    dataset: u64,
    /// Number of series in the training data.
    n_series: usize,
    /// Resumable loop state.
    state: S,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `state` to `path` via a temporary file and a rename.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ShapeletError::SerializeCheckpoint`] | bincode encoding failed |
/// | [`ShapeletError::WriteCheckpoint`] | writing or renaming the file failed |
#[instrument(skip(config, data, state), fields(path = %path.display(), cases_so_far = state.cases_so_far))]
pub(crate) fn save_checkpoint(
    path: &Path,
    config: &ShapeletConfig,
    data: &Dataset,
    state: &SearchState,
) -> Result<(), ShapeletError> {
    let envelope = CheckpointEnvelope {
        format_version: FORMAT_VERSION,
        config: ConfigFingerprint::of(config),
        dataset: data.fingerprint(),
        n_series: data.len(),
        state,
    };

    let bytes = bincode::serialize(&envelope)
        .map_err(|e| ShapeletError::SerializeCheckpoint { source: e })?;

    let tmp = temp_path(path);
    std::fs::write(&tmp, &bytes).map_err(|e| ShapeletError::WriteCheckpoint {
        path: tmp.clone(),
        source: e,
    })?;
    std::fs::rename(&tmp, path).map_err(|e| ShapeletError::WriteCheckpoint {
        path: path.to_path_buf(),
        source: e,
    })?;

    debug!(size_bytes = bytes.len(), retained = state.best.len(), "checkpoint written");
    Ok(())
}

/// Load the search state saved at `path` for this configuration and dataset.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`ShapeletError::ReadCheckpoint`] | file read failed |
/// | [`ShapeletError::DeserializeCheckpoint`] | bincode decoding failed |
/// | [`ShapeletError::IncompatibleCheckpointVersion`] | format version mismatch |
/// | [`ShapeletError::ResumeMismatch`] | configuration or dataset differs |
#[instrument(skip(config, data), fields(path = %path.display()))]
pub(crate) fn load_checkpoint(
    path: &Path,
    config: &ShapeletConfig,
    data: &Dataset,
) -> Result<SearchState, ShapeletError> {
    let bytes = std::fs::read(path).map_err(|e| ShapeletError::ReadCheckpoint {
        path: path.to_path_buf(),
        source: e,
    })?;

    let envelope: CheckpointEnvelope<SearchState> =
        bincode::deserialize(&bytes).map_err(|e| ShapeletError::DeserializeCheckpoint {
            path: path.to_path_buf(),
            source: e,
        })?;

    if envelope.format_version != FORMAT_VERSION {
        return Err(ShapeletError::IncompatibleCheckpointVersion {
            expected: FORMAT_VERSION,
            found: envelope.format_version,
            path: path.to_path_buf(),
        });
    }

    let differing = envelope.config.differing_fields(&ConfigFingerprint::of(config));
    if !differing.is_empty() {
        return Err(ShapeletError::ResumeMismatch {
            path: path.to_path_buf(),
            reason: format!("configuration differs in {}", differing.join(", ")),
        });
    }
    if envelope.n_series != data.len() || envelope.dataset != data.fingerprint() {
        return Err(ShapeletError::ResumeMismatch {
            path: path.to_path_buf(),
            reason: "checkpoint was written for a different dataset".to_string(),
        });
    }

    info!(
        cases_so_far = envelope.state.cases_so_far,
        pass = envelope.state.pass,
        retained = envelope.state.best.len(),
        elapsed_ms = envelope.state.elapsed_ms,
        "checkpoint loaded"
    );
    Ok(envelope.state)
}

#[cfg(test)]
mod tests {
    use sieve_distance::TimeSeries;
    use tempfile::TempDir;

    use super::*;
    use crate::dataset::LabeledSeries;

    fn data(offset: f64) -> Dataset {
        let series = (0..4)
            .map(|i| {
                let values = (0..8).map(|t| (t as f64 + i as f64) * 0.5 + offset).collect();
                LabeledSeries::univariate(TimeSeries::new(values).unwrap(), i % 2)
            })
            .collect();
        Dataset::new(series, 2).unwrap()
    }

    #[test]
    fn round_trip_restores_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search.ckpt");
        let config = ShapeletConfig::new(3, 3, 4).unwrap();
        let data = data(0.0);
        let mut state = SearchState::fresh(&config, &data);
        state.cases_so_far = 2;
        state.elapsed_ms = 1234;

        save_checkpoint(&path, &config, &data, &state).unwrap();
        assert!(!temp_path(&path).exists());
        let loaded = load_checkpoint(&path, &config, &data).unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn refuses_other_configuration_or_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search.ckpt");
        let config = ShapeletConfig::new(3, 3, 4).unwrap();
        let state = SearchState::fresh(&config, &data(0.0));
        save_checkpoint(&path, &config, &data(0.0), &state).unwrap();

        let other = config.clone().with_seed(7);
        match load_checkpoint(&path, &other, &data(0.0)).unwrap_err() {
            ShapeletError::ResumeMismatch { reason, .. } => assert!(reason.contains("seed")),
            e => panic!("unexpected error {e:?}"),
        }
        assert!(matches!(
            load_checkpoint(&path, &config, &data(1.0)),
            Err(ShapeletError::ResumeMismatch { .. })
        ));
    }

    #[test]
    fn corrupt_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.ckpt");
        std::fs::write(&path, b"definitely not bincode").unwrap();
        let config = ShapeletConfig::new(3, 3, 4).unwrap();
        assert!(matches!(
            load_checkpoint(&path, &config, &data(0.0)),
            Err(ShapeletError::DeserializeCheckpoint { .. })
        ));
    }
}
