//! Symmetric pairwise distance matrix.

use crate::distance::MsmDistance;

/// Pairwise distances stored as a packed lower triangle.
///
/// Entry `(i, j)` with `i > j` lives at `i*(i-1)/2 + j`. The diagonal is implicit zero.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<MsmDistance>,
}

pub(crate) fn packed_index(i: usize, j: usize) -> usize {
    let (row, col) = if i > j { (i, j) } else { (j, i) };
    row * (row - 1) / 2 + col
}

/// Inverse of [`packed_index`] for `flat < n*(n-1)/2`.
pub(crate) fn unpack_index(flat: usize) -> (usize, usize) {
    let mut row = ((1.0 + (1.0 + 8.0 * flat as f64).sqrt()) / 2.0).floor() as usize;
    // Guard against rounding on very large indices.
    while row * (row - 1) / 2 > flat {
        row -= 1;
    }
    while (row + 1) * row / 2 <= flat {
        row += 1;
    }
    (row, flat - row * (row - 1) / 2)
}

impl DistanceMatrix {
    pub(crate) fn from_packed(n: usize, data: Vec<MsmDistance>) -> Self {
        debug_assert_eq!(data.len(), n * n.saturating_sub(1) / 2);
        Self { n, data }
    }

    /// Number of series covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// True when no series are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Distance between series `i` and `j`; zero on the diagonal.
    ///
    /// # Panics
    ///
    /// Panics if either index is `>= len()`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> MsmDistance {
        assert!(i < self.n && j < self.n, "index ({i}, {j}) out of bounds for {} series", self.n);
        if i == j {
            return MsmDistance::new(0.0);
        }
        self.data[packed_index(i, j)]
    }

    /// Dense `n x n` copy of the matrix as raw values.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.n)
            .map(|i| (0..self.n).map(|j| self.get(i, j).value()).collect())
            .collect()
    }

    /// Iterate over `(i, j, distance)` for every pair with `i > j`.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, MsmDistance)> + '_ {
        self.data.iter().enumerate().map(|(flat, &d)| {
            let (i, j) = unpack_index(flat);
            (i, j, d)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_by_three() -> DistanceMatrix {
        // (1,0)=0.5, (2,0)=1.5, (2,1)=2.5
        let data = [0.5, 1.5, 2.5].into_iter().map(MsmDistance::new).collect();
        DistanceMatrix::from_packed(3, data)
    }

    #[test]
    fn packing_round_trips() {
        for flat in 0..5050 {
            let (i, j) = unpack_index(flat);
            assert!(i > j);
            assert_eq!(packed_index(i, j), flat);
        }
    }

    #[test]
    fn symmetric_with_zero_diagonal() {
        let m = three_by_three();
        assert_eq!(m.get(2, 1).value(), 2.5);
        assert_eq!(m.get(1, 2).value(), 2.5);
        assert_eq!(m.get(1, 1).value(), 0.0);
    }

    #[test]
    fn dense_rows() {
        let rows = three_by_three().to_rows();
        assert_eq!(rows[0], vec![0.0, 0.5, 1.5]);
        assert_eq!(rows[2], vec![1.5, 2.5, 0.0]);
    }

    #[test]
    fn iter_visits_each_pair_once() {
        let pairs: Vec<_> = three_by_three().iter().map(|(i, j, _)| (i, j)).collect();
        assert_eq!(pairs, vec![(1, 0), (2, 0), (2, 1)]);
    }
}
