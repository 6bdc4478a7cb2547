//! Sorted index-set primitives.
//!
//! Index lists here are strictly increasing `usize` coefficient indices. The
//! prior index sets describe, for a sparse posterior update, which prior
//! coefficient feeds which posterior slot.

use alloc::vec::Vec;

/// Locate `x` in a strictly increasing slice.
///
/// Returns `(i, true)` when `values[i] == x`, otherwise `(i, false)` where
/// `i` is the position of the smallest value greater than `x` (or
/// `values.len()` when `x` exceeds every value).
pub fn search_sorted(values: &[usize], x: usize) -> (usize, bool) {
    match values.binary_search(&x) {
        Ok(i) => (i, true),
        Err(i) => (i, false),
    }
}

/// First position whose value is `>= x`.
#[inline]
fn lower_bound(values: &[usize], x: usize) -> usize {
    search_sorted(values, x).0
}

/// First position whose value is `> x`.
#[inline]
fn upper_bound(values: &[usize], x: usize) -> usize {
    match search_sorted(values, x) {
        (i, true) => i + 1,
        (i, false) => i,
    }
}

/// Sorted union of two strictly increasing lists.
pub fn merge_indices(a: &[usize], b: &[usize]) -> Vec<usize> {
    if a.is_empty() {
        return b.to_vec();
    }
    if b.is_empty() {
        return a.to_vec();
    }

    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] < b[j] {
            merged.push(a[i]);
            i += 1;
        } else if a[i] > b[j] {
            merged.push(b[j]);
            j += 1;
        } else {
            merged.push(a[i]);
            i += 1;
            j += 1;
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

/// Whether a list is strictly increasing.
pub fn is_strictly_increasing(values: &[usize]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}

/// A posterior slot (position in the posterior index list) and the prior
/// coefficient index it reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexPair {
    /// Position in the posterior index list.
    pub slot: usize,
    /// Prior coefficient index.
    pub prior: usize,
}

/// The four prior-to-posterior index maps of a Bayesian update with
/// repetition count `k`.
///
/// For posterior index `n`:
/// - `direct`: prior `n`, for `n` in `[1, N_prior]`
/// - `raised`: prior `n + k`, for `n` in `[1, N_prior - k]`
/// - `mirrored`: conjugated prior `k - n`, for `n` in
///   `[max(1, k - N_prior), min(k - 1, N_post)]`
/// - `lowered`: prior `n - k`, for `n` in `[k, N_post]`
///
/// Slots within each set are increasing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorIndexSets {
    /// Same-index contributions.
    pub direct: Vec<IndexPair>,
    /// Contributions from `k` indices above.
    pub raised: Vec<IndexPair>,
    /// Conjugated contributions reflected about `k`.
    pub mirrored: Vec<IndexPair>,
    /// Contributions from `k` indices below.
    pub lowered: Vec<IndexPair>,
}

impl PriorIndexSets {
    /// Derive the index maps for the posterior indices `post_idx`, which must
    /// be strictly increasing.
    ///
    /// `n_prior` is the prior truncation order and `n_post` the posterior's.
    pub fn new(n_prior: usize, n_post: usize, k: usize, post_idx: &[usize]) -> Self {
        let first = lower_bound(post_idx, 1);
        let collect = |start: usize, end: usize, map: &dyn Fn(usize) -> usize| -> Vec<IndexPair> {
            (start..end.max(start))
                .map(|slot| IndexPair {
                    slot,
                    prior: map(post_idx[slot]),
                })
                .collect()
        };

        let direct = collect(first, upper_bound(post_idx, n_prior), &|n| n);

        let raised = if n_prior > k {
            collect(first, upper_bound(post_idx, n_prior - k), &|n| n + k)
        } else {
            Vec::new()
        };

        let mirrored = if k >= 2 {
            let start = lower_bound(post_idx, k.saturating_sub(n_prior).max(1));
            let end = upper_bound(post_idx, (k - 1).min(n_post));
            collect(start, end, &|n| k - n)
        } else {
            Vec::new()
        };

        let lowered = if n_post >= k {
            collect(lower_bound(post_idx, k), upper_bound(post_idx, n_post), &|n| n - k)
        } else {
            Vec::new()
        };

        Self {
            direct,
            raised,
            mirrored,
            lowered,
        }
    }

    /// Sorted, de-duplicated prior indices needed by all four maps.
    pub fn prior_indices(&self) -> Vec<usize> {
        let priors = |set: &[IndexPair]| set.iter().map(|p| p.prior).collect::<Vec<_>>();
        // Mirrored priors decrease with the slot.
        let mut mirrored = priors(&self.mirrored);
        mirrored.reverse();
        let upper = merge_indices(&priors(&self.direct), &priors(&self.raised));
        let lower = merge_indices(&mirrored, &priors(&self.lowered));
        merge_indices(&upper, &lower)
    }
}

/// Prior indices needed to compute the posterior coefficients `post_idx`.
pub fn prior_indices(n_prior: usize, n_post: usize, k: usize, post_idx: &[usize]) -> Vec<usize> {
    PriorIndexSets::new(n_prior, n_post, k, post_idx).prior_indices()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn search_sorted_positions() {
        let v = [1, 3, 5, 9];
        assert_eq!(search_sorted(&v, 5), (2, true));
        assert_eq!(search_sorted(&v, 0), (0, false));
        assert_eq!(search_sorted(&v, 4), (2, false));
        assert_eq!(search_sorted(&v, 10), (4, false));
        assert_eq!(search_sorted(&[], 3), (0, false));
    }

    #[test]
    fn merge_removes_duplicates() {
        assert_eq!(merge_indices(&[1, 4, 6], &[2, 4, 7, 9]), vec![1, 2, 4, 6, 7, 9]);
        assert_eq!(merge_indices(&[], &[2, 3]), vec![2, 3]);
        assert_eq!(merge_indices(&[2, 3], &[]), vec![2, 3]);
    }

    #[test]
    fn prior_sets_full_range() {
        // Dense posterior 0..=5 from a prior of order 3 with k = 2.
        let post: Vec<usize> = (0..=5).collect();
        let sets = PriorIndexSets::new(3, 5, 2, &post);

        let direct: Vec<_> = sets.direct.iter().map(|p| (p.slot, p.prior)).collect();
        assert_eq!(direct, vec![(1, 1), (2, 2), (3, 3)]);

        let raised: Vec<_> = sets.raised.iter().map(|p| (p.slot, p.prior)).collect();
        assert_eq!(raised, vec![(1, 3)]);

        let mirrored: Vec<_> = sets.mirrored.iter().map(|p| (p.slot, p.prior)).collect();
        assert_eq!(mirrored, vec![(1, 1)]);

        let lowered: Vec<_> = sets.lowered.iter().map(|p| (p.slot, p.prior)).collect();
        assert_eq!(lowered, vec![(2, 0), (3, 1), (4, 2), (5, 3)]);

        assert_eq!(sets.prior_indices(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn prior_sets_sparse_posterior() {
        // Only c_4 of the posterior: direct c_4, raised c_7, lowered c_1 for k = 3.
        let sets = PriorIndexSets::new(8, 10, 3, &[4]);
        assert_eq!(sets.prior_indices(), vec![1, 4, 7]);
        assert!(sets.mirrored.is_empty());
    }

    #[test]
    fn mirrored_needs_large_k() {
        // k = 6 with prior order 2: mirrored covers n in [4, 5] reading 2, 1.
        let post: Vec<usize> = (1..=8).collect();
        let sets = PriorIndexSets::new(2, 8, 6, &post);
        let mirrored: Vec<_> = sets.mirrored.iter().map(|p| (post[p.slot], p.prior)).collect();
        assert_eq!(mirrored, vec![(4, 2), (5, 1)]);
    }

    #[test]
    fn empty_posterior_needs_nothing() {
        assert!(prior_indices(5, 7, 2, &[]).is_empty());
    }
}
