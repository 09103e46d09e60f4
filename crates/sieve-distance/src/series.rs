//! Validated time series channels.

use std::ops::Index;

use crate::error::DistanceError;

fn validate(values: &[f64]) -> Result<(), DistanceError> {
    if values.is_empty() {
        return Err(DistanceError::EmptySeries);
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(DistanceError::NonFiniteValue { index });
    }
    Ok(())
}

/// One owned channel of samples. Guaranteed non-empty with all finite values.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries(Vec<f64>);

impl TimeSeries {
    /// Create a new channel, validating that it is non-empty and all values are finite.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptySeries`] | `values` is empty |
    /// | [`DistanceError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(values: Vec<f64>) -> Result<Self, DistanceError> {
        validate(&values)?;
        Ok(Self(values))
    }

    /// Borrow the whole channel as a view.
    #[must_use]
    pub fn as_view(&self) -> TimeSeriesView<'_> {
        TimeSeriesView(&self.0)
    }

    /// Borrow the samples.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Borrow `length` samples starting at `start`, or `None` when the window overruns the channel.
    #[must_use]
    pub fn window(&self, start: usize, length: usize) -> Option<TimeSeriesView<'_>> {
        self.as_view().window(start, length)
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a constructed channel.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume and return the samples.
    #[must_use]
    pub fn into_inner(self) -> Vec<f64> {
        self.0
    }
}

impl AsRef<[f64]> for TimeSeries {
    fn as_ref(&self) -> &[f64] {
        &self.0
    }
}

impl TryFrom<Vec<f64>> for TimeSeries {
    type Error = DistanceError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

/// Borrowed, validated run of samples.
#[derive(Debug, Clone, Copy)]
pub struct TimeSeriesView<'a>(&'a [f64]);

impl<'a> TimeSeriesView<'a> {
    /// Create a view over `slice`, applying the same checks as [`TimeSeries::new`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`DistanceError::EmptySeries`] | `slice` is empty |
    /// | [`DistanceError::NonFiniteValue`] | Any value is NaN or infinite |
    pub fn new(slice: &'a [f64]) -> Result<Self, DistanceError> {
        validate(slice)?;
        Ok(Self(slice))
    }

    /// Return the underlying slice.
    #[must_use]
    pub fn as_slice(&self) -> &'a [f64] {
        self.0
    }

    /// Sub-view of `length` samples from `start`; `None` if out of range or empty.
    #[must_use]
    pub fn window(&self, start: usize, length: usize) -> Option<TimeSeriesView<'a>> {
        let end = start.checked_add(length)?;
        if length == 0 || end > self.0.len() {
            return None;
        }
        Some(Self(&self.0[start..end]))
    }

    /// Return the number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false` for a validated view.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Index<usize> for TimeSeriesView<'_> {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl AsRef<[f64]> for TimeSeriesView<'_> {
    fn as_ref(&self) -> &[f64] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_non_finite() {
        assert!(matches!(TimeSeries::new(vec![]), Err(DistanceError::EmptySeries)));
        assert!(matches!(
            TimeSeries::new(vec![0.5, f64::NAN]),
            Err(DistanceError::NonFiniteValue { index: 1 })
        ));
        assert!(matches!(
            TimeSeriesView::new(&[f64::NEG_INFINITY]),
            Err(DistanceError::NonFiniteValue { index: 0 })
        ));
    }

    #[test]
    fn window_bounds() {
        let ts = TimeSeries::new(vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(ts.window(1, 3).unwrap().as_slice(), &[2.0, 3.0, 4.0]);
        assert_eq!(ts.window(2, 3).unwrap().as_slice(), &[3.0, 4.0, 5.0]);
        assert!(ts.window(3, 3).is_none());
        assert!(ts.window(0, 0).is_none());
        assert!(ts.window(usize::MAX, 2).is_none());
    }

    #[test]
    fn nested_window_indexing() {
        let ts = TimeSeries::new(vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let outer = ts.window(1, 3).unwrap();
        let inner = outer.window(1, 2).unwrap();
        assert_eq!(inner[0], 30.0);
        assert_eq!(inner[1], 40.0);
    }
}
