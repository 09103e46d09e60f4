//! CSV reader for labelled time series with full input validation.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use sieve_distance::TimeSeries;
use sieve_shapelet::{Dataset, LabeledSeries};
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::LabeledDataset;

/// Reads labelled time series from a CSV file.
///
/// Expected CSV format:
/// - Header row required (first column is the class label, remaining are positional samples)
/// - `label,t0,t1,...,tn`
/// - One row per series. Rows may be shorter than the header by leaving
///   trailing cells empty, which gives variable-length series.
/// - With [`with_channels`](Self::with_channels) set to `c`, each row's samples
///   are split into `c` equally long channels, channel 0 first.
///
/// Class labels are arbitrary strings. Unless class names are supplied with
/// [`with_classes`](Self::with_classes), the distinct labels are sorted
/// (numerically when every label is a number) and indexed in that order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::InvalidChannelCount`] | channel count is zero |
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has more columns than the header |
/// | [`IoError::MissingLabel`] | Label cell is empty |
/// | [`IoError::EmptySeries`] | Row has a label but no samples |
/// | [`IoError::InteriorGap`] | A sample follows an empty cell |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
/// | [`IoError::UnevenChannels`] | Samples do not split evenly into channels |
/// | [`IoError::UnknownClass`] | Label missing from the supplied class names |
/// | [`IoError::InvalidDataset`] | Rows disagree on channel count |
pub struct DatasetReader {
    path: PathBuf,
    channels: usize,
    classes: Option<Vec<String>>,
}

impl DatasetReader {
    /// Create a new reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            channels: 1,
            classes: None,
        }
    }

    /// Split each row into `channels` channels.
    #[must_use]
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = channels;
        self
    }

    /// Encode labels with these class names, e.g. the training set's, so a
    /// test set shares its class indices.
    #[must_use]
    pub fn with_classes(mut self, class_names: Vec<String>) -> Self {
        self.classes = Some(class_names);
        self
    }

    /// Read and validate the CSV file, returning a [`LabeledDataset`].
    #[instrument(skip(self), fields(path = %self.path.display(), channels = self.channels))]
    pub fn read(&self) -> Result<LabeledDataset, IoError> {
        if self.channels == 0 {
            return Err(IoError::InvalidChannelCount);
        }

        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // flexible(true) lets short rows through so trailing empties and our
        // own row-length check handle them instead of a CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let mut labels: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<f64>> = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            if record.len() > expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let label = record.get(0).unwrap_or("").trim();
            if label.is_empty() {
                return Err(IoError::MissingLabel {
                    path: self.path.clone(),
                    row_index,
                });
            }

            let values = self.parse_samples(row_index, record.iter().skip(1))?;
            if values.is_empty() {
                return Err(IoError::EmptySeries {
                    path: self.path.clone(),
                    row_index,
                });
            }
            if values.len() % self.channels != 0 {
                return Err(IoError::UnevenChannels {
                    path: self.path.clone(),
                    row_index,
                    samples: values.len(),
                    channels: self.channels,
                });
            }

            labels.push(label.to_string());
            rows.push(values);
        }

        if rows.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let class_names = match &self.classes {
            Some(names) => names.clone(),
            None => sorted_classes(&labels),
        };
        let index: HashMap<&str, usize> = class_names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut series = Vec::with_capacity(rows.len());
        for (row_index, (label, values)) in labels.iter().zip(rows).enumerate() {
            let Some(&class) = index.get(label.as_str()) else {
                return Err(IoError::UnknownClass {
                    path: self.path.clone(),
                    row_index,
                    label: label.clone(),
                    known: class_names.clone(),
                });
            };
            let channel_len = values.len() / self.channels;
            let channels = values
                .chunks(channel_len)
                .map(|chunk| TimeSeries::new(chunk.to_vec()))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| IoError::InvalidDataset {
                    path: self.path.clone(),
                    source: e.into(),
                })?;
            series.push(LabeledSeries::new(channels, class));
        }

        let dataset =
            Dataset::new(series, class_names.len()).map_err(|e| IoError::InvalidDataset {
                path: self.path.clone(),
                source: e,
            })?;

        info!(
            n_series = dataset.len(),
            n_classes = class_names.len(),
            n_channels = dataset.n_channels(),
            max_len = dataset.max_len(),
            "dataset loaded"
        );

        Ok(LabeledDataset::new(class_names, dataset))
    }

    /// Parse sample cells, allowing only trailing empties.
    fn parse_samples<'a>(
        &self,
        row_index: usize,
        cells: impl Iterator<Item = &'a str>,
    ) -> Result<Vec<f64>, IoError> {
        let mut values = Vec::new();
        let mut gap_at: Option<usize> = None;
        for (col_index, raw) in cells.enumerate() {
            let raw = raw.trim();
            if raw.is_empty() {
                gap_at.get_or_insert(col_index);
                continue;
            }
            if gap_at.is_some() {
                return Err(IoError::InteriorGap {
                    path: self.path.clone(),
                    row_index,
                    col_index,
                });
            }
            let non_finite = || IoError::NonFiniteValue {
                path: self.path.clone(),
                row_index,
                col_index,
                raw: raw.to_string(),
            };
            let value: f64 = raw.parse().map_err(|_| non_finite())?;
            if !value.is_finite() {
                return Err(non_finite());
            }
            values.push(value);
        }
        Ok(values)
    }
}

/// Distinct labels, numerically sorted when all of them are numbers.
fn sorted_classes(labels: &[String]) -> Vec<String> {
    let distinct: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
    let numeric: Option<Vec<(f64, &str)>> = distinct
        .iter()
        .map(|l| l.parse::<f64>().ok().map(|v| (v, *l)))
        .collect();
    match numeric {
        Some(mut pairs) => {
            pairs.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)));
            pairs.into_iter().map(|(_, l)| l.to_string()).collect()
        }
        None => distinct.into_iter().map(str::to_string).collect(),
    }
}
