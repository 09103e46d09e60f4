//! Human-readable shapelet log that can rebuild a transform without rediscovery.
//!
//! CSV with the header `quality,seriesId,startPos,classVal,numChannels,dimension`.
//! Each shapelet is one record with those six fields followed by
//! `numChannels` records holding its content.

use std::path::Path;
use std::sync::Arc;

use sieve_distance::SubsequenceDistance;
use tracing::{debug, info, instrument};

use crate::error::ShapeletError;
use crate::quality::Score;
use crate::shapelet::{Candidate, Shapelet};
use crate::transform::ShapeletTransform;

const HEADER: [&str; 6] = [
    "quality",
    "seriesId",
    "startPos",
    "classVal",
    "numChannels",
    "dimension",
];

impl ShapeletTransform {
    /// Write the shapelet log to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::WriteLog`] if the file cannot be written.
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn write_log(&self, path: impl AsRef<Path>) -> Result<(), ShapeletError> {
        let path = path.as_ref();
        let wrap = |e: csv::Error| ShapeletError::WriteLog {
            path: path.to_path_buf(),
            source: e,
        };

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .map_err(wrap)?;
        writer.write_record(HEADER).map_err(wrap)?;

        for s in self.shapelets() {
            writer
                .write_record([
                    s.quality().to_string(),
                    s.series_id().to_string(),
                    s.start().to_string(),
                    s.class_value().to_string(),
                    s.n_channels().to_string(),
                    s.dimension().to_string(),
                ])
                .map_err(wrap)?;
            for row in s.content() {
                writer
                    .write_record(row.iter().map(f64::to_string))
                    .map_err(wrap)?;
            }
        }
        writer.flush().map_err(|e| wrap(e.into()))?;

        info!(shapelets = self.len(), "shapelet log written");
        Ok(())
    }

    /// Rebuild a transform from the log at `path`.
    ///
    /// `distance` must be the distance the shapelets were discovered with.
    /// Separation gaps are not logged and come back as `None`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::ReadLog`] | the file cannot be opened or read |
    /// | [`ShapeletError::ParseLog`] | a record is malformed or the log ends mid-shapelet |
    #[instrument(skip(distance), fields(path = %path.as_ref().display()))]
    pub fn from_log(
        path: impl AsRef<Path>,
        distance: Arc<dyn SubsequenceDistance>,
    ) -> Result<Self, ShapeletError> {
        let path = path.as_ref();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ShapeletError::ReadLog {
                path: path.to_path_buf(),
                source: e,
            })?;

        let mut records = reader.records();
        let mut shapelets = Vec::new();
        let mut last_line = 1;

        while let Some(record) = records.next() {
            let record = record.map_err(|e| ShapeletError::ReadLog {
                path: path.to_path_buf(),
                source: e,
            })?;
            let line = record.position().map_or(last_line + 1, csv::Position::line);
            last_line = line;
            let parse_err = |reason: String| ShapeletError::ParseLog {
                path: path.to_path_buf(),
                line,
                reason,
            };

            if record.len() != HEADER.len() {
                return Err(parse_err(format!(
                    "expected a {}-field shapelet record, found {} fields",
                    HEADER.len(),
                    record.len()
                )));
            }
            let field = |i: usize| record.get(i).unwrap_or("").trim();
            let quality: f64 = field(0)
                .parse()
                .map_err(|_| parse_err(format!("invalid quality '{}'", field(0))))?;
            let integer = |i: usize| -> Result<usize, ShapeletError> {
                field(i)
                    .parse()
                    .map_err(|_| parse_err(format!("invalid {} '{}'", HEADER[i], field(i))))
            };
            let series_id = integer(1)?;
            let start = integer(2)?;
            let class_value = integer(3)?;
            let n_channels = integer(4)?;
            let dimension = integer(5)?;
            if n_channels == 0 {
                return Err(parse_err("numChannels must be at least 1".to_string()));
            }

            let mut content: Vec<Vec<f64>> = Vec::with_capacity(n_channels);
            for _ in 0..n_channels {
                let Some(row) = records.next() else {
                    return Err(parse_err(format!(
                        "log ends after {} of {n_channels} content rows",
                        content.len()
                    )));
                };
                let row = row.map_err(|e| ShapeletError::ReadLog {
                    path: path.to_path_buf(),
                    source: e,
                })?;
                last_line = row.position().map_or(last_line + 1, csv::Position::line);
                let values = row
                    .iter()
                    .map(|v| v.trim().parse::<f64>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| ShapeletError::ParseLog {
                        path: path.to_path_buf(),
                        line: last_line,
                        reason: format!("invalid content value: {e}"),
                    })?;
                content.push(values);
            }

            let length = content[0].len();
            if length == 0 || content.iter().any(|r| r.len() != length) {
                return Err(parse_err(
                    "content rows must be non-empty and equally long".to_string(),
                ));
            }

            shapelets.push(Shapelet::new(
                Candidate {
                    series_id,
                    start,
                    length,
                    dimension,
                },
                class_value,
                Score {
                    quality,
                    separation_gap: None,
                },
                content,
            ));
        }

        debug!(shapelets = shapelets.len(), "shapelet log parsed");
        Ok(Self::new(shapelets, distance))
    }
}

#[cfg(test)]
mod tests {
    use sieve_distance::ZNormEuclidean;
    use tempfile::TempDir;

    use super::*;

    fn sample_transform() -> ShapeletTransform {
        let make = |series_id, dimension, quality, content: Vec<Vec<f64>>| {
            Shapelet::new(
                Candidate {
                    series_id,
                    start: 2,
                    length: content[0].len(),
                    dimension,
                },
                series_id % 2,
                Score {
                    quality,
                    separation_gap: Some(0.25),
                },
                content,
            )
        };
        ShapeletTransform::new(
            vec![
                make(
                    3,
                    0,
                    0.918_295_834_054_489_6,
                    vec![vec![-1.224_744_871_391_589, 0.0, 1.224_744_871_391_589]],
                ),
                make(4, 1, 0.1 + 0.2, vec![vec![0.1, -0.3], vec![1e-300, 7.0]]),
            ],
            Arc::new(ZNormEuclidean),
        )
    }

    #[test]
    fn round_trip_preserves_everything_but_the_gap() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shapelets.csv");
        let original = sample_transform();
        original.write_log(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("quality,seriesId,startPos,classVal,numChannels,dimension\n"));

        let loaded = ShapeletTransform::from_log(&path, Arc::new(ZNormEuclidean)).unwrap();
        assert_eq!(loaded.len(), 2);
        for (a, b) in original.shapelets().iter().zip(loaded.shapelets()) {
            assert_eq!(a.quality(), b.quality());
            assert_eq!(a.candidate(), b.candidate());
            assert_eq!(a.class_value(), b.class_value());
            assert_eq!(a.content(), b.content());
            assert!(b.separation_gap().is_none());
        }
    }

    #[test]
    fn truncated_log_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(
            &path,
            "quality,seriesId,startPos,classVal,numChannels,dimension\n0.5,0,0,1,2,0\n1.0,2.0\n",
        )
        .unwrap();
        let err = ShapeletTransform::from_log(&path, Arc::new(ZNormEuclidean)).unwrap_err();
        assert!(matches!(err, ShapeletError::ParseLog { line: 2, .. }), "{err:?}");
    }

    #[test]
    fn bad_number_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(
            &path,
            "quality,seriesId,startPos,classVal,numChannels,dimension\n0.5,0,0,1,1,0\n1.0,abc\n",
        )
        .unwrap();
        let err = ShapeletTransform::from_log(&path, Arc::new(ZNormEuclidean)).unwrap_err();
        assert!(matches!(err, ShapeletError::ParseLog { line: 3, .. }), "{err:?}");
    }
}
