//! Candidate enumeration: which (length, start, dimension) triples to score.
//!
//! The search only decides enumeration order and volume. Scoring happens in
//! a caller-supplied evaluator; candidates it rejects are dropped.

use rand::SeedableRng;
use rand::seq::index;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::shapelet::{Candidate, Shapelet};

/// How many candidates to draw from each series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchType {
    /// Every candidate in the space.
    Full,
    /// `per_series` distinct candidates drawn uniformly at random.
    Random {
        /// Candidates drawn per series per pass.
        per_series: usize,
    },
}

/// How candidates use the channels of a multivariate series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChannelMode {
    /// A candidate lives on one channel and is compared with that channel only.
    #[default]
    Independent,
    /// A candidate spans every channel at the same offset.
    Dependent,
}

/// Enumerates candidates for one series at a time.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSearch {
    search_type: SearchType,
    min_length: usize,
    max_length: usize,
    length_increment: usize,
    position_increment: usize,
    channel_mode: ChannelMode,
    seed: u64,
}

impl CandidateSearch {
    /// Full search over lengths `min_length..=max_length`.
    ///
    /// Increments must be at least 1; the configuration validates them.
    #[must_use]
    pub fn new(min_length: usize, max_length: usize) -> Self {
        Self {
            search_type: SearchType::Full,
            min_length,
            max_length,
            length_increment: 1,
            position_increment: 1,
            channel_mode: ChannelMode::Independent,
            seed: 42,
        }
    }

    /// Set the search type.
    #[must_use]
    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Step between candidate lengths.
    #[must_use]
    pub fn with_length_increment(mut self, length_increment: usize) -> Self {
        self.length_increment = length_increment.max(1);
        self
    }

    /// Step between candidate start positions.
    #[must_use]
    pub fn with_position_increment(mut self, position_increment: usize) -> Self {
        self.position_increment = position_increment.max(1);
        self
    }

    /// Set the channel mode.
    #[must_use]
    pub fn with_channel_mode(mut self, channel_mode: ChannelMode) -> Self {
        self.channel_mode = channel_mode;
        self
    }

    /// Seed for random search.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the search type.
    #[must_use]
    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    fn lengths(&self, series_len: usize) -> impl Iterator<Item = usize> + '_ {
        (self.min_length..=self.max_length.min(series_len)).step_by(self.length_increment)
    }

    fn dimensions(&self, n_channels: usize) -> usize {
        match self.channel_mode {
            ChannelMode::Independent => n_channels,
            ChannelMode::Dependent => usize::from(n_channels > 0),
        }
    }

    fn starts_for(&self, series_len: usize, length: usize) -> usize {
        (series_len - length) / self.position_increment + 1
    }

    /// Size of the full candidate space of one series.
    #[must_use]
    pub fn space_size(&self, series_len: usize, n_channels: usize) -> usize {
        let dims = self.dimensions(n_channels);
        self.lengths(series_len)
            .map(|l| self.starts_for(series_len, l) * dims)
            .sum()
    }

    /// True when a pass visits every candidate of a series this shape.
    #[must_use]
    pub fn covers_space(&self, series_len: usize, n_channels: usize) -> bool {
        match self.search_type {
            SearchType::Full => true,
            SearchType::Random { per_series } => per_series >= self.space_size(series_len, n_channels),
        }
    }

    /// Candidates of series `series_id` for pass `pass`, in enumeration order.
    ///
    /// Order is length ascending, then start, then dimension. Random search
    /// keeps that order for the sampled subset.
    #[must_use]
    pub fn candidates(
        &self,
        series_id: usize,
        series_len: usize,
        n_channels: usize,
        pass: usize,
    ) -> Vec<Candidate> {
        let dims = self.dimensions(n_channels);
        let total = self.space_size(series_len, n_channels);

        let picked: Option<Vec<usize>> = match self.search_type {
            SearchType::Random { per_series } if per_series < total => {
                let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
                rng.set_stream(((pass as u64) << 32) ^ series_id as u64);
                let mut flat = index::sample(&mut rng, total, per_series).into_vec();
                flat.sort_unstable();
                Some(flat)
            }
            _ => None,
        };

        let mut out = Vec::with_capacity(picked.as_ref().map_or(total, Vec::len));
        let mut flat = 0usize;
        let mut next_pick = 0usize;
        for length in self.lengths(series_len) {
            for s in 0..self.starts_for(series_len, length) {
                for dimension in 0..dims {
                    let wanted = match &picked {
                        None => true,
                        Some(p) if p.get(next_pick) == Some(&flat) => {
                            next_pick += 1;
                            true
                        }
                        Some(_) => false,
                    };
                    if wanted {
                        out.push(Candidate {
                            series_id,
                            start: s * self.position_increment,
                            length,
                            dimension,
                        });
                    }
                    flat += 1;
                }
            }
        }
        out
    }

    /// Enumerate and score the candidates of one series.
    ///
    /// `evaluate` returns `None` for candidates pruned during scoring.
    pub fn search_in_series<F>(
        &self,
        series_id: usize,
        series_len: usize,
        n_channels: usize,
        pass: usize,
        mut evaluate: F,
    ) -> Vec<Shapelet>
    where
        F: FnMut(Candidate) -> Option<Shapelet>,
    {
        self.candidates(series_id, series_len, n_channels, pass)
            .into_iter()
            .filter_map(|c| evaluate(c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn full_search_counts_every_window() {
        let search = CandidateSearch::new(3, 5);
        // lengths 3, 4, 5 over 10 samples: 8 + 7 + 6
        assert_eq!(search.candidates(0, 10, 1, 0).len(), 21);
        assert_eq!(search.space_size(10, 2), 42);
        let first = search.candidates(7, 10, 1, 0)[0];
        assert_eq!(
            first,
            Candidate {
                series_id: 7,
                start: 0,
                length: 3,
                dimension: 0
            }
        );
    }

    #[test]
    fn increments_skip_lengths_and_positions() {
        let search = CandidateSearch::new(2, 6)
            .with_length_increment(2)
            .with_position_increment(3);
        let got: Vec<(usize, usize)> = search
            .candidates(0, 8, 1, 0)
            .iter()
            .map(|c| (c.length, c.start))
            .collect();
        assert_eq!(
            got,
            vec![(2, 0), (2, 3), (2, 6), (4, 0), (4, 3), (6, 0)]
        );
    }

    #[test]
    fn lengths_clip_to_short_series() {
        let search = CandidateSearch::new(3, 10);
        assert_eq!(search.space_size(4, 1), 3); // lengths 3 (2 starts) and 4 (1 start)
        assert!(search.candidates(0, 2, 1, 0).is_empty());
    }

    #[test]
    fn dependent_mode_uses_one_dimension() {
        let search = CandidateSearch::new(3, 3).with_channel_mode(ChannelMode::Dependent);
        assert!(search.candidates(0, 5, 4, 0).iter().all(|c| c.dimension == 0));
        assert_eq!(search.space_size(5, 4), 3);
    }

    #[test]
    fn random_search_is_distinct_seeded_and_varies_by_pass() {
        let search = CandidateSearch::new(3, 6)
            .with_search_type(SearchType::Random { per_series: 10 })
            .with_seed(9);
        let a = search.candidates(2, 30, 1, 0);
        assert_eq!(a.len(), 10);
        assert_eq!(a.iter().collect::<HashSet<_>>().len(), 10);
        assert_eq!(a, search.candidates(2, 30, 1, 0));
        assert_ne!(a, search.candidates(2, 30, 1, 1));
    }

    #[test]
    fn oversized_budget_enumerates_everything() {
        let full = CandidateSearch::new(3, 5);
        let random = full.clone().with_search_type(SearchType::Random { per_series: 1000 });
        assert!(random.covers_space(10, 1));
        assert_eq!(random.candidates(0, 10, 1, 3), full.candidates(0, 10, 1, 0));
    }
}
