//! Paired two-sided Wilcoxon signed-rank test.
//!
//! Zero differences are discarded before ranking. Tied magnitudes receive
//! average ranks; doubling every rank keeps them integral, which lets the
//! null distribution of the positive rank sum be enumerated exactly for the
//! observed tie pattern.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedRankOutcome {
    /// Number of non-zero paired differences.
    pub n: usize,
    /// Sum of ranks of the positive differences.
    pub w_plus: f64,
    pub p_value: f64,
}

/// Returns `None` when every paired difference is zero (or there are no
/// pairs): the test has no information and callers treat it as not
/// significant.
pub fn signed_rank_test(a: &[f64], b: &[f64]) -> Option<SignedRankOutcome> {
    debug_assert_eq!(a.len(), b.len());
    let diffs: Vec<f64> = a
        .iter()
        .zip(b)
        .map(|(x, y)| x - y)
        .filter(|d| *d != 0.0)
        .collect();
    if diffs.is_empty() {
        return None;
    }

    let doubled = doubled_ranks(&diffs);
    let w_plus2: usize = diffs
        .iter()
        .zip(&doubled)
        .filter(|(d, _)| **d > 0.0)
        .map(|(_, r)| *r)
        .sum();

    let dist = null_distribution(&doubled);
    let upper: f64 = dist[w_plus2..].iter().sum();
    let lower: f64 = dist[..=w_plus2].iter().sum();
    let p_value = (2.0 * upper.min(lower)).min(1.0);

    Some(SignedRankOutcome {
        n: diffs.len(),
        w_plus: w_plus2 as f64 / 2.0,
        p_value,
    })
}

/// Twice the average rank of each `|d|`, in input order.
fn doubled_ranks(diffs: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..diffs.len()).collect();
    order.sort_by(|&i, &j| {
        diffs[i]
            .abs()
            .partial_cmp(&diffs[j].abs())
            .unwrap_or(Ordering::Equal)
    });

    let mut ranks = vec![0usize; diffs.len()];
    let mut start = 0usize;
    while start < order.len() {
        let magnitude = diffs[order[start]].abs();
        let mut end = start;
        while end + 1 < order.len() && diffs[order[end + 1]].abs() == magnitude {
            end += 1;
        }
        // average of 1-based ranks start+1..=end+1, doubled
        let rank2 = start + end + 2;
        for &idx in &order[start..=end] {
            ranks[idx] = rank2;
        }
        start = end + 1;
    }
    ranks
}

/// P(S = s) for S the sum of a random subset of `weights`, each element
/// included independently with probability 1/2.
fn null_distribution(weights: &[usize]) -> Vec<f64> {
    let total: usize = weights.iter().sum();
    let mut dist = vec![0.0f64; total + 1];
    dist[0] = 1.0;
    let mut reach = 0usize;
    for &w in weights {
        for s in (0..=reach).rev() {
            let p = dist[s] * 0.5;
            dist[s] = p;
            dist[s + w] += p;
        }
        reach += w;
    }
    dist
}

#[cfg(test)]
#[path = "../../tests/src_inline/stats/signed_rank.rs"]
mod tests;
