//! Result writer for transformed tables, discovery summaries and distance matrices.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sieve_distance::{BandConstraint, DistanceMatrix, Msm};
use sieve_shapelet::{DiscoveryResult, DiscoveryStats, SearchType, ShapeletConfig, TransformedTable};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes discovery and transform results into one output directory.
///
/// Creates the output directory on construction if it does not exist.
/// Files are prefixed with the experiment name:
///
/// | File | Content |
/// |---|---|
/// | `{experiment}_transform.csv` | shapelet-distance features plus a class column |
/// | `{experiment}_shapelets.json` | discovery summary |
/// | `{experiment}_shapelets.csv` | shapelet log, see [`log_path`](Self::log_path) |
/// | `{experiment}_search.ckpt` | discovery checkpoint, see [`checkpoint_path`](Self::checkpoint_path) |
/// | `{experiment}_pairwise.json` | MSM distance matrix |
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{suffix}", self.experiment.as_str()))
    }

    /// Write a transformed table to `{experiment}_transform.csv`.
    ///
    /// One row per series: the shapelet distances followed by the class
    /// name, or the class index when no name is known.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteCsv`] if the file cannot be written.
    #[instrument(skip_all, fields(rows = table.len()))]
    pub fn write_transform(
        &self,
        table: &TransformedTable,
        class_names: &[String],
    ) -> Result<PathBuf, IoError> {
        let path = self.file("transform.csv");
        let wrap = |e: csv::Error| IoError::WriteCsv {
            path: path.clone(),
            source: e,
        };

        let mut wtr = csv::Writer::from_path(&path).map_err(wrap)?;
        let header = table
            .column_names()
            .iter()
            .map(String::as_str)
            .chain(std::iter::once("class"));
        wtr.write_record(header).map_err(wrap)?;

        for (row, &label) in table.rows().iter().zip(table.labels()) {
            let class = class_names
                .get(label)
                .cloned()
                .unwrap_or_else(|| label.to_string());
            let record = row.iter().map(f64::to_string).chain(std::iter::once(class));
            wtr.write_record(record).map_err(wrap)?;
        }
        wtr.flush().map_err(|e| wrap(e.into()))?;

        info!(path = %path.display(), columns = table.column_names().len(), "transform written");
        Ok(path)
    }

    /// Write a discovery summary to `{experiment}_shapelets.json`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the summary cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(shapelets = result.shapelets().len()))]
    pub fn write_summary(
        &self,
        config: &ShapeletConfig,
        result: &DiscoveryResult,
        class_names: &[String],
    ) -> Result<PathBuf, IoError> {
        let path = self.file("shapelets.json");

        let (search, per_series) = match config.search_type() {
            SearchType::Full => ("full", None),
            SearchType::Random { per_series } => ("random", Some(per_series)),
        };
        let shapelets = result
            .shapelets()
            .iter()
            .map(|s| ShapeletEntry {
                series_id: s.series_id(),
                start: s.start(),
                length: s.length(),
                dimension: s.dimension(),
                n_channels: s.n_channels(),
                class: s.class_value(),
                class_name: class_names.get(s.class_value()).map(String::as_str),
                quality: s.quality(),
                separation_gap: s.separation_gap(),
            })
            .collect();

        let artifact = SummaryArtifact {
            experiment: self.experiment.as_str(),
            k: config.k(),
            min_length: config.min_length(),
            max_length: config.max_length(),
            search,
            per_series,
            distance: config.distance().name(),
            quality: config.quality().name(),
            seed: config.seed(),
            class_names,
            stats: result.stats(),
            shapelets,
        };

        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "discovery summary written");
        Ok(path)
    }

    /// Write a pairwise MSM matrix to `{experiment}_pairwise.json`.
    ///
    /// `labels` names the rows, e.g. class names per series.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::SerializeJson`] | the matrix cannot be encoded |
    /// | [`IoError::WriteFile`] | the file cannot be written |
    #[instrument(skip_all, fields(n = matrix.len()))]
    pub fn write_pairwise(
        &self,
        msm: &Msm,
        matrix: &DistanceMatrix,
        labels: &[String],
    ) -> Result<PathBuf, IoError> {
        let path = self.file("pairwise.json");
        let artifact = PairwiseArtifact {
            experiment: self.experiment.as_str(),
            n_series: matrix.len(),
            cost: msm.cost(),
            band: msm.constraint(),
            labels,
            distances: matrix.to_rows(),
        };
        self.write_json(&path, &artifact)?;
        info!(path = %path.display(), "pairwise matrix written");
        Ok(path)
    }

    fn write_json<T: Serialize>(&self, path: &Path, artifact: &T) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(artifact).map_err(|e| IoError::SerializeJson {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, &json).map_err(|e| IoError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Return the path of the shapelet log, `{output_dir}/{experiment}_shapelets.csv`.
    ///
    /// Does not write anything.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.file("shapelets.csv")
    }

    /// Return the path of the discovery checkpoint, `{output_dir}/{experiment}_search.ckpt`.
    ///
    /// Does not write anything.
    #[must_use]
    pub fn checkpoint_path(&self) -> PathBuf {
        self.file("search.ckpt")
    }
}

// --- Shadow structs for JSON serialization ---

#[derive(Serialize)]
struct SummaryArtifact<'a> {
    experiment: &'a str,
    k: usize,
    min_length: usize,
    max_length: usize,
    search: &'static str,
    per_series: Option<usize>,
    distance: &'static str,
    quality: &'static str,
    seed: u64,
    class_names: &'a [String],
    stats: &'a DiscoveryStats,
    shapelets: Vec<ShapeletEntry<'a>>,
}

#[derive(Serialize)]
struct ShapeletEntry<'a> {
    series_id: usize,
    start: usize,
    length: usize,
    dimension: usize,
    n_channels: usize,
    class: usize,
    class_name: Option<&'a str>,
    quality: f64,
    separation_gap: Option<f64>,
}

#[derive(Serialize)]
struct PairwiseArtifact<'a> {
    experiment: &'a str,
    n_series: usize,
    cost: f64,
    band: BandConstraint,
    labels: &'a [String],
    distances: Vec<Vec<f64>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_directory_and_names_files() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("out");
        let writer = ResultWriter::new(&out, ExperimentName::new("exp1".into()).unwrap()).unwrap();
        assert!(out.is_dir());
        assert_eq!(writer.log_path(), out.join("exp1_shapelets.csv"));
        assert_eq!(writer.checkpoint_path(), out.join("exp1_search.ckpt"));
    }

    #[test]
    fn pairwise_json_has_a_full_matrix() {
        use sieve_distance::TimeSeries;

        let dir = TempDir::new().unwrap();
        let writer =
            ResultWriter::new(dir.path(), ExperimentName::new("pw".into()).unwrap()).unwrap();
        let series = vec![
            TimeSeries::new(vec![0.0, 0.0, 0.0]).unwrap(),
            TimeSeries::new(vec![1.0, 1.0, 1.0]).unwrap(),
            TimeSeries::new(vec![0.0, 1.0, 0.0]).unwrap(),
        ];
        let msm = Msm::default();
        let matrix = msm.pairwise(&series);
        let labels = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let path = writer.write_pairwise(&msm, &matrix, &labels).unwrap();

        let content: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(content["n_series"], 3);
        let rows = content["distances"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        // [0,0,0] vs [1,1,1] at the default cost
        assert_eq!(rows[0][0].as_f64().unwrap(), 0.0);
        assert_eq!(rows[0][1], rows[1][0]);
        assert!((rows[0][1].as_f64().unwrap() - 1.4).abs() < 1e-10);
    }
}
