//! Search-cost estimates used to turn a time contract into a random-search budget.

use std::time::Duration;

/// Estimated cost of one operation of [`estimate_operations`].
pub const NANOS_PER_OPERATION: u128 = 10;

/// Candidates of a full search over `n` series of length `m`.
///
/// `n * sum_{l = min..=max} (m - l + 1)`; lengths above `m` contribute nothing.
#[must_use]
pub fn count_candidates(n: usize, m: usize, min_length: usize, max_length: usize) -> u128 {
    count_candidates_with_skipping(n, m, min_length, max_length, 1, 1)
}

/// [`count_candidates`] with position and length increments applied.
#[must_use]
pub fn count_candidates_with_skipping(
    n: usize,
    m: usize,
    min_length: usize,
    max_length: usize,
    position_increment: usize,
    length_increment: usize,
) -> u128 {
    let position_increment = position_increment.max(1);
    let per_series: u128 = (min_length.max(1)..=max_length.min(m))
        .step_by(length_increment.max(1))
        .map(|l| ((m - l) / position_increment + 1) as u128)
        .sum();
    per_series * n as u128
}

/// Distance operations of a full search: `n * sum_l (m-l+1)^2 * l * (n-1)`.
#[must_use]
pub fn estimate_operations(n: usize, m: usize, min_length: usize, max_length: usize) -> u128 {
    let per_series: u128 = (min_length.max(1)..=max_length.min(m))
        .map(|l| {
            let windows = (m - l + 1) as u128;
            windows * windows * l as u128
        })
        .sum();
    per_series
        .saturating_mul(n as u128)
        .saturating_mul(n.saturating_sub(1) as u128)
}

/// Random-search candidates per series that fit `contract`.
///
/// `None` when a full search is expected to finish within the contract.
/// Otherwise the full candidate count is scaled by the fraction of the work
/// that fits, spread evenly over the series, and never drops below one.
#[must_use]
pub fn per_series_budget(
    n: usize,
    m: usize,
    min_length: usize,
    max_length: usize,
    contract: Duration,
) -> Option<usize> {
    let affordable = contract.as_nanos() / NANOS_PER_OPERATION;
    let needed = estimate_operations(n, m, min_length, max_length);
    if needed <= affordable || n == 0 {
        return None;
    }
    let fraction = affordable as f64 / needed as f64;
    let total = count_candidates(n, m, min_length, max_length) as f64 * fraction;
    Some(((total / n as f64).floor() as usize).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_counts() {
        // lengths 3..=5 on m = 10: 8 + 7 + 6 per series
        assert_eq!(count_candidates(4, 10, 3, 5), 84);
        // lengths 3 and 5, starts every 2nd: (7/2+1) + (5/2+1) = 4 + 3
        assert_eq!(count_candidates_with_skipping(1, 10, 3, 5, 2, 2), 7);
        assert_eq!(count_candidates(3, 4, 5, 8), 0);
    }

    #[test]
    fn operation_estimate() {
        // n = 2, m = 4, l = 4 only: 2 * (1 * 1 * 4) * 1
        assert_eq!(estimate_operations(2, 4, 4, 4), 8);
        // l = 3: windows 2 -> 4 * 3 = 12, l = 4 -> 4; per series 16; 3 * 16 * 2
        assert_eq!(estimate_operations(3, 4, 3, 4), 96);
    }

    #[test]
    fn generous_contract_means_full_search() {
        assert_eq!(per_series_budget(10, 20, 3, 20, Duration::from_secs(3600)), None);
    }

    #[test]
    fn tight_contract_scales_the_budget() {
        let n = 100;
        let m = 200;
        let ops = estimate_operations(n, m, 3, m);
        // Afford a tenth of the work.
        let contract = Duration::from_nanos((ops * NANOS_PER_OPERATION / 10) as u64);
        let budget = per_series_budget(n, m, 3, m, contract).unwrap();
        let full_per_series = (count_candidates(n, m, 3, m) / n as u128) as usize;
        assert!(budget <= full_per_series / 10 + 1);
        assert!(budget + 1 >= full_per_series / 10);
    }

    #[test]
    fn budget_never_drops_to_zero() {
        assert_eq!(per_series_budget(50, 500, 3, 500, Duration::from_nanos(1)), Some(1));
    }
}
