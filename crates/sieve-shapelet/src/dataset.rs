//! Labelled, possibly multivariate training and test data.

use sieve_distance::TimeSeries;

use crate::error::ShapeletError;

/// One instance: equally long channels and a zero-based class label.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledSeries {
    channels: Vec<TimeSeries>,
    label: usize,
}

impl LabeledSeries {
    /// Create a multivariate instance. Validated when added to a [`Dataset`].
    #[must_use]
    pub fn new(channels: Vec<TimeSeries>, label: usize) -> Self {
        Self { channels, label }
    }

    /// Create a single-channel instance.
    #[must_use]
    pub fn univariate(series: TimeSeries, label: usize) -> Self {
        Self::new(vec![series], label)
    }

    /// Borrow all channels.
    #[must_use]
    pub fn channels(&self) -> &[TimeSeries] {
        &self.channels
    }

    /// Borrow one channel.
    #[must_use]
    pub fn channel(&self, dimension: usize) -> Option<&TimeSeries> {
        self.channels.get(dimension)
    }

    /// Number of channels.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.channels.len()
    }

    /// Number of samples per channel.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.first().map_or(0, TimeSeries::len)
    }

    /// True when the instance has no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Class label.
    #[must_use]
    pub fn label(&self) -> usize {
        self.label
    }

    /// Raw slices of `count` channels starting at `first`.
    pub(crate) fn channel_slices(&self, first: usize, count: usize) -> Vec<&[f64]> {
        self.channels
            .iter()
            .skip(first)
            .take(count)
            .map(TimeSeries::as_slice)
            .collect()
    }
}

/// A validated collection of labelled series.
///
/// Every series has the same channel count, the channels of one series share
/// a length, and every label is below `n_classes`. Lengths may differ
/// between series.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    series: Vec<LabeledSeries>,
    n_classes: usize,
}

impl Dataset {
    /// Validate and wrap `series`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`ShapeletError::EmptyDataset`] | `series` is empty |
    /// | [`ShapeletError::EmptySeries`] | a series has no channels |
    /// | [`ShapeletError::ChannelMismatch`] | channel counts differ between series |
    /// | [`ShapeletError::ChannelLengthMismatch`] | channels of one series differ in length |
    /// | [`ShapeletError::LabelOutOfRange`] | a label is `>= n_classes` |
    pub fn new(series: Vec<LabeledSeries>, n_classes: usize) -> Result<Self, ShapeletError> {
        let Some(first) = series.first() else {
            return Err(ShapeletError::EmptyDataset);
        };
        let expected_channels = first.n_channels();

        for (series_index, s) in series.iter().enumerate() {
            if s.channels.is_empty() {
                return Err(ShapeletError::EmptySeries { series_index });
            }
            if s.n_channels() != expected_channels {
                return Err(ShapeletError::ChannelMismatch {
                    series_index,
                    expected: expected_channels,
                    got: s.n_channels(),
                });
            }
            let expected = s.len();
            if let Some((channel, c)) = s
                .channels
                .iter()
                .enumerate()
                .find(|(_, c)| c.len() != expected)
            {
                return Err(ShapeletError::ChannelLengthMismatch {
                    series_index,
                    channel,
                    expected,
                    got: c.len(),
                });
            }
            if s.label >= n_classes {
                return Err(ShapeletError::LabelOutOfRange {
                    series_index,
                    label: s.label,
                    n_classes,
                });
            }
        }

        Ok(Self { series, n_classes })
    }

    /// Borrow the series in input order.
    #[must_use]
    pub fn series(&self) -> &[LabeledSeries] {
        &self.series
    }

    /// Number of series.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Always false for a validated dataset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Declared number of classes.
    #[must_use]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Channel count shared by every series.
    #[must_use]
    pub fn n_channels(&self) -> usize {
        self.series.first().map_or(0, LabeledSeries::n_channels)
    }

    /// Length of the longest series.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.series.iter().map(LabeledSeries::len).max().unwrap_or(0)
    }

    /// Labels in input order.
    #[must_use]
    pub fn labels(&self) -> Vec<usize> {
        self.series.iter().map(LabeledSeries::label).collect()
    }

    /// Number of series per class, indexed by label.
    #[must_use]
    pub fn class_counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for s in &self.series {
            counts[s.label] += 1;
        }
        counts
    }

    /// FNV-1a hash over labels, shapes and sample bits.
    pub(crate) fn fingerprint(&self) -> u64 {
        const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
        const PRIME: u64 = 0x0100_0000_01b3;

        let mut hash = OFFSET;
        let mut feed = |word: u64| {
            for byte in word.to_le_bytes() {
                hash ^= u64::from(byte);
                hash = hash.wrapping_mul(PRIME);
            }
        };
        feed(self.n_classes as u64);
        for s in &self.series {
            feed(s.label as u64);
            feed(s.n_channels() as u64);
            for channel in &s.channels {
                feed(channel.len() as u64);
                for &v in channel.as_slice() {
                    feed(v.to_bits());
                }
            }
        }
        hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(values: &[f64]) -> TimeSeries {
        TimeSeries::new(values.to_vec()).unwrap()
    }

    #[test]
    fn counts_classes() {
        let data = Dataset::new(
            vec![
                LabeledSeries::univariate(ts(&[1.0, 2.0]), 0),
                LabeledSeries::univariate(ts(&[1.0, 2.0, 3.0]), 2),
                LabeledSeries::univariate(ts(&[0.0]), 2),
            ],
            3,
        )
        .unwrap();
        assert_eq!(data.class_counts(), vec![1, 0, 2]);
        assert_eq!(data.max_len(), 3);
        assert_eq!(data.labels(), vec![0, 2, 2]);
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(Dataset::new(vec![], 2), Err(ShapeletError::EmptyDataset)));

        let err = Dataset::new(vec![LabeledSeries::univariate(ts(&[1.0]), 2)], 2).unwrap_err();
        assert!(matches!(err, ShapeletError::LabelOutOfRange { label: 2, .. }));

        let err = Dataset::new(
            vec![
                LabeledSeries::univariate(ts(&[1.0]), 0),
                LabeledSeries::new(vec![ts(&[1.0]), ts(&[2.0])], 0),
            ],
            1,
        )
        .unwrap_err();
        assert!(matches!(err, ShapeletError::ChannelMismatch { series_index: 1, .. }));

        let err = Dataset::new(vec![LabeledSeries::new(vec![ts(&[1.0, 2.0]), ts(&[2.0])], 0)], 1)
            .unwrap_err();
        assert!(matches!(err, ShapeletError::ChannelLengthMismatch { channel: 1, .. }));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = Dataset::new(vec![LabeledSeries::univariate(ts(&[1.0, 2.0]), 0)], 1).unwrap();
        let b = Dataset::new(vec![LabeledSeries::univariate(ts(&[1.0, 2.5]), 0)], 1).unwrap();
        assert_eq!(a.fingerprint(), a.clone().fingerprint());
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
