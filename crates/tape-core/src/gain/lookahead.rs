//! Expected gain of a planned sequence of measurements.
//!
//! The expectation runs over the binary outcome tree of the sequence. Deep
//! levels of the tree are evaluated on sparse coefficient subsets planned
//! once per call; shallow levels whose subsets would not be sparse enough
//! update a working copy of the full density and restore it after each
//! branch.

use alloc::vec;
use alloc::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Tolerances;
use crate::density::{CoeffSource, CoeffSubset, PhaseDensity};
use crate::error::{DensityError, Result};
use crate::math::phasor;
use crate::search::{fibonacci_search_max, merge_indices, prior_indices};
use crate::types::{GainKind, GainPoint, Outcome, ShotSetting, C_ZERO};

/// Coefficient indices the entropy gain reads for contracted repetition
/// count `km` against a series of order `n`.
///
/// Always `km` itself, then the multiples of `km` up to `n` when the
/// measurement's symmetry is below one, otherwise only the multiples of
/// `2·km`.
pub fn entropy_gain_indices(density: &PhaseDensity, km: usize, n: usize) -> Vec<usize> {
    if km == 0 {
        return Vec::new();
    }
    let threshold = 1.0 - 0.8 * density.tolerances().epsilon;
    let k = km * density.magnification();
    let odd = density
        .model()
        .symmetries()
        .get(k - 1)
        .map_or(true, |&lambda| lambda <= threshold);

    let step = if odd { km } else { 2 * km };
    let mut count = n / step;
    if !odd && n / km > 0 {
        count += 1;
    }
    if count == 0 {
        return Vec::new();
    }
    let first_multiple = if odd { 2 } else { 1 };
    core::iter::once(km)
        .chain((first_multiple..).map(|m| m * step))
        .take(count)
        .collect()
}

/// Coefficient indices the variance and sharpness gains read:
/// `km - 1`, `km`, `km + 1` and index 1, restricted to `0..=n`.
pub fn variance_gain_indices(km: usize, n: usize) -> Vec<usize> {
    let candidates: Vec<usize> = if km < 3 {
        km.checked_sub(1).into_iter().chain([km, km + 1]).collect()
    } else {
        vec![1, km - 1, km, km + 1]
    };
    candidates.into_iter().filter(|&i| i <= n).collect()
}

fn gain_indices(density: &PhaseDensity, kind: GainKind, km: usize, n: usize) -> Vec<usize> {
    match kind {
        GainKind::Entropy => entropy_gain_indices(density, km, n),
        GainKind::Variance | GainKind::Sharpness => variance_gain_indices(km, n),
    }
}

/// Sparse subsets for the deep levels of a lookahead.
///
/// Subset `j` holds the coefficients, after `dense_depth() + 1 + j`
/// measurements, that the rest of the sequence reads.
#[derive(Debug, Clone)]
pub struct LookaheadPlan {
    repetitions: Vec<usize>,
    subsets: Vec<CoeffSubset>,
    dense_depth: usize,
}

impl LookaheadPlan {
    /// Plan a lookahead over the repetition counts `ks` (at least two) for
    /// the given gain kind.
    ///
    /// Walks backward from the last measurement, adding the prior indices
    /// each posterior subset needs, and stops at the first level whose
    /// subset is not sparse enough; that level and all earlier ones use the
    /// full density.
    pub fn new(density: &PhaseDensity, ks: &[usize], kind: GainKind) -> Result<Self> {
        if ks.len() < 2 {
            return Err(DensityError::TooFewShots(ks.len()));
        }
        for &k in ks {
            density.check_repetition(k)?;
        }
        let kms: Vec<usize> = ks.iter().map(|k| k / density.magnification()).collect();
        let n_max = density.max_order();

        // Truncation order after each of the first m - 1 measurements.
        let mut orders = Vec::with_capacity(ks.len() - 1);
        let mut n = density.order();
        for &km in &kms[..ks.len() - 1] {
            n = (n + km).min(n_max);
            orders.push(n);
        }

        let min_sparsity = density.tolerances().min_sparsity;
        let is_sparse = |len: usize, n: usize| n > 0 && 1.0 - len as f64 / n as f64 >= min_sparsity;

        let mut subsets = Vec::new();
        let mut s = ks.len() - 1;
        let mut idx = gain_indices(density, kind, kms[s], orders[s - 1]);
        while is_sparse(idx.len(), orders[s - 1]) {
            subsets.push(CoeffSubset::from_sorted(orders[s - 1], idx));
            s -= 1;
            if s == 0 {
                break;
            }
            let needed = match subsets.last() {
                Some(post) if !post.is_empty() => {
                    prior_indices(orders[s - 1], orders[s], kms[s], post.indices())
                }
                _ => Vec::new(),
            };
            idx = merge_indices(&needed, &gain_indices(density, kind, kms[s], orders[s - 1]));
        }
        subsets.reverse();

        let dense_depth = ks.len() - 1 - subsets.len();
        tracing::debug!(
            shots = ks.len(),
            dense_depth,
            sparse_levels = subsets.len(),
            "planned lookahead"
        );
        Ok(Self {
            repetitions: ks.to_vec(),
            subsets,
            dense_depth,
        })
    }

    /// Planned repetition counts.
    pub fn repetitions(&self) -> &[usize] {
        &self.repetitions
    }

    /// Sparse subsets, shallowest first.
    pub fn subsets(&self) -> &[CoeffSubset] {
        &self.subsets
    }

    /// Number of measurements after which the full density is still used.
    pub fn dense_depth(&self) -> usize {
        self.dense_depth
    }
}

impl PhaseDensity {
    /// Total expected gain of measuring with repetition counts `ks` in order,
    /// each angle chosen optimally given the outcomes before it.
    ///
    /// The returned angle is the optimal angle of the first measurement and
    /// matches [`best_gain_angle`](Self::best_gain_angle) for `ks[0]`.
    ///
    /// # Errors
    ///
    /// [`DensityError::TooFewShots`] for fewer than two counts, any invalid
    /// repetition count, or a failure of the underlying gain.
    pub fn multi_shot_gain(&self, ks: &[usize], kind: GainKind) -> Result<GainPoint> {
        let mut plan = LookaheadPlan::new(self, ks, kind)?;
        let first = self.best_gain_angle(ks[0], kind)?;
        let mut workspace = self.clone();
        let rest = workspace.next_shots_gain(&mut plan, kind, 1, first.angle)?;
        Ok(GainPoint::new(first.angle, first.gain + rest))
    }

    /// Expected gain of measurements `s..` given measurement `s - 1` at
    /// `angle`.
    fn next_shots_gain(
        &mut self,
        plan: &mut LookaheadPlan,
        kind: GainKind,
        s: usize,
        angle: f64,
    ) -> Result<f64> {
        let k_prev = plan.repetitions[s - 1];
        let km = k_prev / self.magnification();
        let mut gains = [0.0; 2];

        let (n_prior, ck) = if s > plan.dense_depth {
            let pos = s - 1 - plan.dense_depth;
            let prior = if pos > 0 {
                let prior = &plan.subsets[pos - 1];
                let ck = if km <= prior.order() { prior.get(km)? } else { C_ZERO };
                (prior.order(), ck)
            } else {
                (self.order(), self.dense().coeff(km)?)
            };
            for (gain, outcome) in gains.iter_mut().zip(Outcome::ALL) {
                *gain = self.sparse_branch(plan, kind, s, pos, angle, outcome)?;
            }
            prior
        } else {
            let prior = (self.order(), self.dense().coeff(km)?);
            let snapshot = self.snapshot();
            for (gain, outcome) in gains.iter_mut().zip(Outcome::ALL) {
                let branch = self.dense_branch(plan, kind, s, angle, outcome);
                self.restore(&snapshot);
                *gain = branch?;
            }
            prior
        };

        let (angle, _) = self.contracted_setting(angle, k_prev)?;
        let (p0, p1) = self.outcome_probs_from(k_prev, n_prior, ck, phasor(angle));
        tracing::trace!(s, p0, gain0 = gains[0], gain1 = gains[1], "lookahead level");
        Ok(p0 * gains[0] + p1 * gains[1])
    }

    fn sparse_branch(
        &mut self,
        plan: &mut LookaheadPlan,
        kind: GainKind,
        s: usize,
        pos: usize,
        angle: f64,
        outcome: Outcome,
    ) -> Result<f64> {
        let k_prev = plan.repetitions[s - 1];
        {
            let (before, after) = plan.subsets.split_at_mut(pos);
            let post = &mut after[0];
            match before.last() {
                Some(prior) => self.update_subset(outcome, angle, k_prev, prior, post)?,
                None => self.update_subset(outcome, angle, k_prev, &self.dense(), post)?,
            }
        }
        let best = self.best_gain_angle_on(plan.repetitions[s], kind, &plan.subsets[pos])?;
        let mut gain = best.gain;
        if s + 1 < plan.repetitions.len() {
            gain += self.next_shots_gain(plan, kind, s + 1, best.angle)?;
        }
        Ok(gain)
    }

    fn dense_branch(
        &mut self,
        plan: &mut LookaheadPlan,
        kind: GainKind,
        s: usize,
        angle: f64,
        outcome: Outcome,
    ) -> Result<f64> {
        self.update(outcome, angle, plan.repetitions[s - 1])?;
        let best = self.best_gain_angle(plan.repetitions[s], kind)?;
        let mut gain = best.gain;
        if s + 1 < plan.repetitions.len() {
            gain += self.next_shots_gain(plan, kind, s + 1, best.angle)?;
        }
        Ok(gain)
    }

    // =========================================================================
    // Shot selection
    // =========================================================================

    /// Choose the repetition count among `ks` with the highest weighted gain
    /// `gain(k) / w_k`, together with its optimal angle.
    ///
    /// Brute force scores every candidate. Otherwise candidates are scanned
    /// in consecutive batches of growing size (see
    /// [`Tolerances`](crate::config::Tolerances)), each searched with a
    /// Fibonacci search, which assumes the weighted gain is unimodal within a
    /// batch.
    pub fn find_best_shot_setting(
        &self,
        ks: &[usize],
        kind: GainKind,
        brute_force: bool,
    ) -> Result<ShotSetting> {
        if ks.is_empty() {
            return Err(DensityError::NoCandidates);
        }
        for &k in ks {
            self.check_range(k)?;
        }
        let score = |k: usize| -> Result<GainPoint> {
            let best = self.best_gain_angle(k, kind)?;
            Ok(GainPoint::new(best.angle, best.gain / self.model().weight(k)))
        };

        let mut best: Option<(usize, GainPoint)> = None;
        if brute_force {
            #[cfg(feature = "parallel")]
            let scored: Vec<Result<GainPoint>> = ks.par_iter().map(|&k| score(k)).collect();
            #[cfg(not(feature = "parallel"))]
            let scored: Vec<Result<GainPoint>> = ks.iter().map(|&k| score(k)).collect();

            for (&k, point) in ks.iter().zip(scored) {
                let point = point?;
                if best.map_or(true, |(_, b)| point > b) {
                    best = Some((k, point));
                }
            }
        } else {
            let Tolerances {
                min_batch_size,
                batch_size_step,
                ..
            } = *self.tolerances();
            let mut batch = min_batch_size.max(1);
            let mut start = 0;
            while start < ks.len() {
                let end = (start + batch).min(ks.len());
                let (i, point) = fibonacci_search_max(&ks[start..end], |&k| score(k))?;
                if best.map_or(true, |(_, b)| point > b) {
                    best = Some((ks[start + i], point));
                }
                start = end;
                batch += batch_size_step;
            }
        }

        let (k, point) = best.ok_or(DensityError::NoCandidates)?;
        tracing::debug!(k, angle = point.angle, weighted_gain = point.gain, "selected shot");
        Ok(ShotSetting {
            angle: point.angle,
            k,
        })
    }
}
