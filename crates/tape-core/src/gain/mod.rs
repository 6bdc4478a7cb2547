//! Expected information gain of a measurement and its optimal angle.
//!
//! Every gain is written once against [`CoeffSource`], so the same formula
//! runs on the live density and on the sparse subsets of the lookahead.
//! The `*_on` forms read the truncation order from the source; the plain
//! forms evaluate the live density.

mod lookahead;

pub use lookahead::{entropy_gain_indices, variance_gain_indices, LookaheadPlan};

use alloc::vec::Vec;
use core::f64::consts::PI;

use crate::constants::BOUNDARY_GUARD;
use crate::density::{a_i, a_ii, b_i, b_ii, CoeffSource, CoeffSubset, PhaseDensity};
use crate::error::{DensityError, Result};
use crate::math::{abs, fold_half_turn, ln, phasor, pow, re_mul, sqrt};
use crate::search::{brent_minimize, PriorIndexSets};
use crate::types::{Complex64, GainKind, GainPoint, Outcome, C_ONE, C_ZERO};

impl PhaseDensity {
    // =========================================================================
    // Outcome probabilities
    // =========================================================================

    /// Marginal probabilities of outcomes 0 and 1 for repetition count `k`
    /// against a series of order `n` whose `k/M`-th coefficient is `ck`.
    ///
    /// `e` is the phasor of the contracted measurement angle.
    pub(crate) fn outcome_probs_from(
        &self,
        k: usize,
        n: usize,
        ck: Complex64,
        e: Complex64,
    ) -> (f64, f64) {
        let lambda = self.model().symmetry(k);
        let mut half = (1.0 - lambda) / 2.0;
        if k / self.magnification() <= n {
            half += lambda * self.model().contrast(k) * re_mul(ck, e) / 2.0;
        }
        (0.5 + half, 0.5 - half)
    }

    /// Probabilities of outcomes 0 and 1 for a measurement at `angle` with
    /// repetition count `k`.
    pub fn outcome_probabilities(&self, angle: f64, k: usize) -> Result<(f64, f64)> {
        self.check_repetition(k)?;
        let (angle, km) = self.contracted_setting(angle, k)?;
        let ck = self.dense().coeff(km)?;
        Ok(self.outcome_probs_from(k, self.order(), ck, phasor(angle)))
    }

    /// Shannon entropy (nats) of the outcome distribution of a measurement.
    pub fn outcome_entropy(&self, angle: f64, k: usize) -> Result<f64> {
        let probs = self.outcome_probabilities(angle, k)?;
        Ok(self.binary_entropy(probs))
    }

    fn binary_entropy(&self, (p0, p1): (f64, f64)) -> f64 {
        let small = self.tolerances().small;
        [p0, p1]
            .into_iter()
            .filter(|&p| p > small)
            .map(|p| -p * ln(p))
            .sum()
    }

    // =========================================================================
    // Gains
    // =========================================================================

    /// Expected reduction of differential entropy from a measurement at
    /// `angle` with repetition count `k`.
    pub fn entropy_gain(&self, angle: f64, k: usize) -> Result<f64> {
        self.entropy_gain_on(angle, k, &self.dense())
    }

    /// Entropy gain evaluated on the coefficients of `cfs`.
    ///
    /// A subset must hold index `k/M` and its multiples up to the order
    /// (only the even multiples when the symmetry is one).
    pub fn entropy_gain_on<C>(&self, angle: f64, k: usize, cfs: &C) -> Result<f64>
    where
        C: CoeffSource + ?Sized,
    {
        self.check_range(k)?;
        if !self.is_informative(k) {
            return Ok(0.0);
        }
        let model = self.model();
        let kc = model.constants(k);
        let lambda = model.symmetry(k);
        let z = model.contrast(k);
        let mut dh = kc.dh0;

        let (angle, km) = self.contracted_setting(angle, k)?;
        let n = cfs.order();
        let e = phasor(angle);
        let e2 = e * e;
        let step = 2 * km;

        // Re(c_{2mk} e^{2imθ}) for m = 1..=N/(2k).
        let n_even = n / step;
        let mut even_terms = Vec::with_capacity(n_even);
        let mut em = C_ONE;
        for m in 1..=n_even {
            em *= e2;
            even_terms.push(re_mul(cfs.coeff(m * step)?, em));
        }
        let even_series = |ratio: f64, root: f64| -> f64 {
            let mut power = 1.0;
            let mut sum = 0.0;
            for (i, re) in even_terms.iter().enumerate() {
                let m = i + 1;
                power *= ratio;
                sum += (a_i(m) + a_ii(m) * root) * power * re;
            }
            sum
        };

        let sum_ax = even_series(kc.zu2, kc.x);
        if lambda >= 1.0 - self.tolerances().epsilon {
            dh += sum_ax;
        } else {
            let sum_ay = even_series(kc.dv2, kc.y);
            dh += ((2.0 - lambda) * sum_ay + lambda * sum_ax) / 2.0;

            let n_odd = (n + km) / step;
            if n_odd > 0 {
                dh += kc.b1 * re_mul(cfs.coeff(km)?, e);
            }
            if n_odd > 1 {
                let mut sum_b = 0.0;
                let mut em = e;
                let (mut zu, mut dv) = (1.0, 1.0);
                for m in 2..=n_odd {
                    zu *= kc.zu2;
                    dv *= kc.dv2;
                    em *= e2;
                    let bx = (b_i(m) * kc.u + b_ii(m) * kc.xu) * zu;
                    let by = (b_i(m) * kc.v + b_ii(m) * kc.yv) * dv;
                    sum_b += (bx - by) * re_mul(cfs.coeff((2 * m - 1) * km)?, em);
                }
                dh += lambda * z * sum_b / 4.0;
            }
        }

        let ck = if km <= n { cfs.coeff(km)? } else { C_ZERO };
        Ok(dh + self.binary_entropy(self.outcome_probs_from(k, n, ck, e)))
    }

    /// Expected reduction of the `1/|c₁|²` variance proxy.
    pub fn variance_gain(&self, angle: f64, k: usize) -> Result<f64> {
        self.variance_gain_on(angle, k, &self.dense())
    }

    /// Variance gain evaluated on the coefficients of `cfs`.
    ///
    /// # Errors
    ///
    /// [`DensityError::UniformDensity`] for order 0 and
    /// [`DensityError::NumericLimit`] when a posterior `|c₁|` vanishes while
    /// the prior variance is already beyond representable accuracy.
    pub fn variance_gain_on<C>(&self, angle: f64, k: usize, cfs: &C) -> Result<f64>
    where
        C: CoeffSource + ?Sized,
    {
        self.check_range(k)?;
        if !self.is_informative(k) {
            return Ok(0.0);
        }
        let small = self.tolerances().small;
        let large = self.tolerances().large;
        let n = cfs.order();
        let mut dv = 0.0;
        if n > 0 {
            let prior = cfs.coeff(1)?.norm_sqr();
            dv += if prior < small { large } else { 1.0 / prior };
        }

        let (angle, km) = self.contracted_setting(angle, k)?;
        let e = phasor(angle);
        let ck = if km <= n { cfs.coeff(km)? } else { C_ZERO };
        let (p0, p1) = self.outcome_probs_from(k, n, ck, e);
        let (plus, minus) = self.sharpness_terms(e, k, km, cfs)?;

        for (p, norm) in [(p0, plus.norm_sqr()), (p1, minus.norm_sqr())] {
            if p > 0.0 {
                if norm <= 0.0 {
                    if dv > sqrt(large) {
                        return Err(DensityError::NumericLimit {
                            quantity: "expected variance gain",
                        });
                    }
                    return Ok(-large);
                }
                dv -= pow(p, 3.0) / norm;
            }
        }
        Ok(dv)
    }

    /// Expected increase of the sharpness `|c₁|`.
    pub fn sharpness_gain(&self, angle: f64, k: usize) -> Result<f64> {
        self.sharpness_gain_on(angle, k, &self.dense())
    }

    /// Sharpness gain evaluated on the coefficients of `cfs`.
    pub fn sharpness_gain_on<C>(&self, angle: f64, k: usize, cfs: &C) -> Result<f64>
    where
        C: CoeffSource + ?Sized,
    {
        self.check_range(k)?;
        if !self.is_informative(k) {
            return Ok(0.0);
        }
        let mut ds = 0.0;
        if cfs.order() > 0 {
            ds -= cfs.coeff(1)?.norm();
        }
        let (angle, km) = self.contracted_setting(angle, k)?;
        let (plus, minus) = self.sharpness_terms(phasor(angle), k, km, cfs)?;
        Ok(ds + plus.norm() + minus.norm())
    }

    /// Outcome-weighted conjugate first coefficients of the two posteriors.
    fn sharpness_terms<C>(
        &self,
        e: Complex64,
        k: usize,
        km: usize,
        cfs: &C,
    ) -> Result<(Complex64, Complex64)>
    where
        C: CoeffSource + ?Sized,
    {
        let n = cfs.order();
        if n == 0 {
            return Err(DensityError::UniformDensity {
                quantity: "expected variance or sharpness gain",
            });
        }
        let lambda = self.model().symmetry(k);
        let c1 = cfs.coeff(1)?.conj();
        let mut plus = c1 * ((2.0 - lambda) / 2.0);
        let mut minus = c1 * (lambda / 2.0);

        if km < n + 2 {
            let mut term = e * cfs.coeff(km - 1)?;
            if km < n {
                term += (e * cfs.coeff(km + 1)?).conj();
            }
            term *= lambda * self.model().contrast(k) / 4.0;
            plus += term;
            minus -= term;
        }
        Ok((plus, minus))
    }

    /// Gain of the given kind on the live density.
    pub fn gain(&self, kind: GainKind, angle: f64, k: usize) -> Result<f64> {
        self.gain_on(kind, angle, k, &self.dense())
    }

    /// Gain of the given kind evaluated on `cfs`.
    pub fn gain_on<C>(&self, kind: GainKind, angle: f64, k: usize, cfs: &C) -> Result<f64>
    where
        C: CoeffSource + ?Sized,
    {
        match kind {
            GainKind::Entropy => self.entropy_gain_on(angle, k, cfs),
            GainKind::Variance => self.variance_gain_on(angle, k, cfs),
            GainKind::Sharpness => self.sharpness_gain_on(angle, k, cfs),
        }
    }

    // =========================================================================
    // Angle optimization
    // =========================================================================

    /// Measurement angle in `[0, π)` maximising the gain for repetition
    /// count `k`.
    pub fn best_gain_angle(&self, k: usize, kind: GainKind) -> Result<GainPoint> {
        self.best_gain_angle_on(k, kind, &self.dense())
    }

    /// [`best_gain_angle`](Self::best_gain_angle) evaluated on `cfs`.
    ///
    /// A minimum within the boundary guard of either end of `[0, π]` is
    /// re-bracketed around itself and searched once more.
    pub fn best_gain_angle_on<C>(&self, k: usize, kind: GainKind, cfs: &C) -> Result<GainPoint>
    where
        C: CoeffSource + ?Sized,
    {
        self.check_range(k)?;
        let bits = self.tolerances().angle_precision_bits;
        let mut negated = |angle: f64| self.gain_on(kind, angle, k, cfs).map(|g| -g);

        let mut best = brent_minimize(&mut negated, 0.0, PI, bits)?;
        if abs(best.x) < BOUNDARY_GUARD || abs(best.x - PI) < BOUNDARY_GUARD {
            best = brent_minimize(&mut negated, best.x - PI / 2.0, best.x + PI / 2.0, bits)?;
        }
        Ok(GainPoint::new(fold_half_turn(best.x), -best.value))
    }

    // =========================================================================
    // Sparse update
    // =========================================================================

    /// Bayesian update computing only the posterior coefficients held by
    /// `post`, reading the prior from `prior`.
    ///
    /// `prior` must hold every index given by
    /// [`prior_indices`](crate::search::prior_indices) for `post`.
    pub fn update_subset<C>(
        &self,
        outcome: Outcome,
        angle: f64,
        k: usize,
        prior: &C,
        post: &mut CoeffSubset,
    ) -> Result<()>
    where
        C: CoeffSource + ?Sized,
    {
        self.check_range(k)?;
        if post.is_empty() {
            return Ok(());
        }
        let (angle, km) = self.contracted_setting(angle, k)?;
        let n_prior = prior.order();
        let sets = PriorIndexSets::new(n_prior, post.order(), km, post.indices());
        let first = usize::from(post.indices()[0] == 0);

        let slots = post.slots_mut();
        slots.fill(C_ZERO);
        if first == 1 {
            slots[0] = C_ONE;
        }

        if !self.is_informative(k) {
            for pair in &sets.direct {
                slots[pair.slot] += prior.coeff(pair.prior)?;
            }
            return Ok(());
        }

        let xi = outcome.sign();
        let lambda = self.model().symmetry(k);
        let xi_lz = xi * lambda * self.model().contrast(k);
        let one_xi = 1.0 + xi * (1.0 - lambda);
        let e = phasor(angle);
        let up = e * (xi_lz / 2.0);
        let down = up.conj();

        for pair in &sets.direct {
            slots[pair.slot] += prior.coeff(pair.prior)? * one_xi;
        }
        for pair in &sets.raised {
            slots[pair.slot] += up * prior.coeff(pair.prior)?;
        }
        for pair in &sets.mirrored {
            slots[pair.slot] += down * prior.coeff(pair.prior)?.conj();
        }
        for pair in &sets.lowered {
            slots[pair.slot] += down * prior.coeff(pair.prior)?;
        }

        let mut a0 = one_xi;
        if km <= n_prior {
            a0 += xi_lz * re_mul(prior.coeff(km)?, e);
        }
        if a0 <= 0.0 {
            return Err(DensityError::NumericLimit {
                quantity: "posterior normalization",
            });
        }
        for c in &mut slots[first..] {
            *c /= a0;
        }
        Ok(())
    }
}
