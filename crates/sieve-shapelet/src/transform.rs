//! Projection of series onto a frozen set of shapelets.

use std::sync::Arc;

use rayon::prelude::*;
use sieve_distance::{SubsequenceDistance, min_distance};
use tracing::{info, instrument};

use crate::dataset::{Dataset, LabeledSeries};
use crate::error::ShapeletError;
use crate::shapelet::Shapelet;

/// A discovered shapelet set and the distance it was discovered with.
///
/// Immutable: projecting data never changes the shapelets.
#[derive(Debug, Clone)]
pub struct ShapeletTransform {
    shapelets: Vec<Shapelet>,
    distance: Arc<dyn SubsequenceDistance>,
}

/// Shapelet-distance features: one row per series, one column per shapelet.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedTable {
    column_names: Vec<String>,
    rows: Vec<Vec<f64>>,
    labels: Vec<usize>,
}

impl TransformedTable {
    /// Feature column names, `shapelet_0`, `shapelet_1`, ...
    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Feature rows in input order.
    #[must_use]
    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Class labels in input order.
    #[must_use]
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ShapeletTransform {
    /// Wrap shapelets whose content was prepared by `distance`.
    #[must_use]
    pub fn new(shapelets: Vec<Shapelet>, distance: Arc<dyn SubsequenceDistance>) -> Self {
        Self {
            shapelets,
            distance,
        }
    }

    /// Borrow the shapelets in column order.
    #[must_use]
    pub fn shapelets(&self) -> &[Shapelet] {
        &self.shapelets
    }

    /// Return the distance used for projection.
    #[must_use]
    pub fn distance(&self) -> &Arc<dyn SubsequenceDistance> {
        &self.distance
    }

    /// Number of shapelets (feature columns).
    #[must_use]
    pub fn len(&self) -> usize {
        self.shapelets.len()
    }

    /// True when no shapelet was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shapelets.is_empty()
    }

    /// Distances from one series to every shapelet.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::MissingChannel`] if a shapelet reads a channel
    /// the series lacks; `series_index` is reported as 0.
    pub fn project_series(&self, series: &LabeledSeries) -> Result<Vec<f64>, ShapeletError> {
        self.row(0, series)
    }

    fn row(&self, series_index: usize, series: &LabeledSeries) -> Result<Vec<f64>, ShapeletError> {
        self.shapelets
            .iter()
            .map(|s| {
                let needed = s.dimension() + s.n_channels();
                if needed > series.n_channels() {
                    return Err(ShapeletError::MissingChannel {
                        series_index,
                        dimension: needed - 1,
                        channels: series.n_channels(),
                    });
                }
                let channels = series.channel_slices(s.dimension(), s.n_channels());
                Ok(min_distance(
                    self.distance.as_ref(),
                    s.content(),
                    &channels,
                    f64::INFINITY,
                ))
            })
            .collect()
    }

    /// Project every series of `data`, in parallel, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeletError::MissingChannel`] if a shapelet reads a channel
    /// some series lacks.
    #[instrument(skip_all, fields(n_series = data.len(), n_shapelets = self.shapelets.len()))]
    pub fn project(&self, data: &Dataset) -> Result<TransformedTable, ShapeletError> {
        let rows = data
            .series()
            .par_iter()
            .enumerate()
            .map(|(i, s)| self.row(i, s))
            .collect::<Result<Vec<_>, _>>()?;

        info!(rows = rows.len(), columns = self.shapelets.len(), "projection complete");

        Ok(TransformedTable {
            column_names: (0..self.shapelets.len())
                .map(|i| format!("shapelet_{i}"))
                .collect(),
            rows,
            labels: data.labels(),
        })
    }
}

#[cfg(test)]
mod tests {
    use sieve_distance::{Euclidean, TimeSeries};

    use super::*;
    use crate::quality::Score;
    use crate::shapelet::Candidate;

    fn shapelet(dimension: usize, content: Vec<Vec<f64>>) -> Shapelet {
        Shapelet::new(
            Candidate {
                series_id: 0,
                start: 0,
                length: content[0].len(),
                dimension,
            },
            0,
            Score {
                quality: 1.0,
                separation_gap: None,
            },
            content,
        )
    }

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn projects_rows_in_input_order() {
        let transform = ShapeletTransform::new(
            vec![shapelet(0, vec![vec![1.0, 2.0]]), shapelet(1, vec![vec![5.0, 5.0]])],
            Arc::new(Euclidean),
        );
        let data = Dataset::new(
            vec![
                LabeledSeries::new(vec![ts(&[0.0, 1.0, 2.0]), ts(&[5.0, 5.0, 4.0])], 1),
                LabeledSeries::new(vec![ts(&[3.0, 3.0, 3.0]), ts(&[4.0, 4.0, 4.0])], 0),
            ],
            2,
        )
        .unwrap();
        let table = transform.project(&data).unwrap();
        assert_eq!(table.column_names(), ["shapelet_0", "shapelet_1"]);
        assert_eq!(table.labels(), [1, 0]);
        assert_eq!(table.rows()[0], vec![0.0, 0.0]);
        // [3,3] vs [1,2]: (4 + 1) / 2; [4,4] vs [5,5]: 1
        assert_eq!(table.rows()[1], vec![2.5, 1.0]);
    }

    #[test]
    fn missing_channel_is_an_error() {
        let transform =
            ShapeletTransform::new(vec![shapelet(1, vec![vec![1.0, 2.0]])], Arc::new(Euclidean));
        let data =
            Dataset::new(vec![LabeledSeries::univariate(ts(&[0.0, 1.0, 2.0]), 0)], 1).unwrap();
        assert!(matches!(
            transform.project(&data),
            Err(ShapeletError::MissingChannel { dimension: 1, channels: 1, .. })
        ));
    }
}
