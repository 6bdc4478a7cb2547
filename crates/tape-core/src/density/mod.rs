//! Phase density represented as a truncated Fourier series.
//!
//! ```text
//! density(θ) = c₀ + Σ_{n=1..N} 2·Re(c_n e^{inθ}),   c₀ = 1
//! ```
//!
//! A density with magnification M > 1 and offset φ₀ represents only the
//! range `[φ₀, φ₀ + 2π/M)` of the true phase, with `φ = φ₀ + θ/M`.

mod coeffs;
mod model;
mod resample;

pub use coeffs::{CoeffSource, CoeffSubset, DenseCoeffs};
pub use model::{a_i, a_ii, b_i, b_ii, KConstants, MeasurementModel};

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::{PI, TAU};

use crate::config::Tolerances;
use crate::error::{DensityError, Result};
use crate::math::{cross, exp, phasor, pow, re_mul, sq, sqrt, wrap_two_pi};
use crate::search::brent_minimize;
use crate::types::{Complex64, Outcome, C_ONE, C_ZERO};
use crate::constants::SPREAD_FLOOR;

/// Probability density over an unknown circular phase.
///
/// Owns its coefficients and its measurement model. Mutated in place by
/// [`update`](Self::update) and the reshaping operations.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseDensity {
    n_max: usize,
    order: usize,
    coeffs: Vec<Complex64>,
    model: MeasurementModel,
    magnification: usize,
    offset: f64,
    tolerances: Tolerances,
}

impl PhaseDensity {
    /// Uniform density with capacity `n_max` and repetition counts `1..=k_max`.
    ///
    /// # Errors
    ///
    /// Fails unless `1 <= k_max <= n_max`.
    pub fn new(n_max: usize, k_max: usize) -> Result<Self> {
        Self::with_magnification(n_max, k_max, 1, 0.0)
    }

    /// Uniform density on the contracted range `[offset, offset + 2π/magnification)`.
    pub fn with_magnification(
        n_max: usize,
        k_max: usize,
        magnification: usize,
        offset: f64,
    ) -> Result<Self> {
        let mut density = Self::scratch(n_max, magnification, offset)?;
        density.set_k_max(k_max)?;
        Ok(density)
    }

    /// Density with a single-k model, used as a resampling workspace.
    pub(crate) fn scratch(n_max: usize, magnification: usize, offset: f64) -> Result<Self> {
        if magnification < 1 {
            return Err(DensityError::InvalidMagnification(magnification));
        }
        let tolerances = Tolerances::default();
        Ok(Self {
            n_max,
            order: 0,
            coeffs: vec![C_ZERO; n_max + 1],
            model: MeasurementModel::new(1, tolerances.epsilon),
            magnification,
            offset: wrap_two_pi(offset),
            tolerances,
        }
        .uniform())
    }

    fn uniform(mut self) -> Self {
        self.set_uniform(false);
        self
    }

    /// Replace the tolerances and recompute dependent constants.
    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self.model.refresh(tolerances.epsilon);
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Coefficient capacity N_max.
    pub fn max_order(&self) -> usize {
        self.n_max
    }

    /// Current truncation order N.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Largest allowed repetition count K.
    pub fn k_max(&self) -> usize {
        self.model.k_max()
    }

    /// Magnification M.
    pub fn magnification(&self) -> usize {
        self.magnification
    }

    /// Offset φ₀ of the contracted range, in `[0, 2π)`.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Measurement model.
    pub fn model(&self) -> &MeasurementModel {
        &self.model
    }

    /// Tolerances of this instance.
    pub fn tolerances(&self) -> &Tolerances {
        &self.tolerances
    }

    /// Coefficients `c_0..=c_N`.
    pub fn coefficients(&self) -> &[Complex64] {
        &self.coeffs[..=self.order]
    }

    /// The live coefficients as a [`CoeffSource`].
    pub fn dense(&self) -> DenseCoeffs<'_> {
        DenseCoeffs::new(self.order, &self.coeffs)
    }

    /// Coefficient `c_n`; zero above the truncation order.
    pub fn harmonic(&self, n: usize) -> Result<Complex64> {
        if n > self.n_max {
            return Err(DensityError::IndexOutOfRange {
                index: n,
                max: self.n_max,
            });
        }
        self.dense().coeff(n)
    }

    // =========================================================================
    // Measurement model
    // =========================================================================

    /// Set K and reset contrasts, symmetries and weights to one.
    pub fn set_k_max(&mut self, k_max: usize) -> Result<()> {
        if k_max < 1 || k_max > self.n_max {
            return Err(DensityError::InvalidMaxRepetition {
                k_max,
                n_max: self.n_max,
            });
        }
        self.model = MeasurementModel::new(k_max, self.tolerances.epsilon);
        Ok(())
    }

    /// Set the contrasts z_k, one per repetition count, each in `[0, 1]`.
    pub fn set_contrasts(&mut self, z: &[f64]) -> Result<()> {
        self.model.set_contrasts(z, self.tolerances.epsilon)
    }

    /// Set the symmetries λ_k, one per repetition count, each in `[0, 1]`.
    pub fn set_symmetries(&mut self, lambda: &[f64]) -> Result<()> {
        self.model.set_symmetries(lambda, self.tolerances.epsilon)
    }

    /// Set the non-zero weights w_k used to rank candidate repetition counts.
    pub fn set_weights(&mut self, w: &[f64]) -> Result<()> {
        self.model.set_weights(w)
    }

    pub(crate) fn copy_model_from(&mut self, other: &PhaseDensity) {
        self.model = other.model.clone();
        self.model.refresh(self.tolerances.epsilon);
    }

    pub(crate) fn check_range(&self, k: usize) -> Result<()> {
        if k < 1 || k > self.k_max() {
            return Err(DensityError::InvalidRepetition {
                k,
                k_max: self.k_max(),
            });
        }
        Ok(())
    }

    /// Check that `k` is a valid repetition count at the current magnification.
    pub fn check_repetition(&self, k: usize) -> Result<()> {
        self.check_range(k)?;
        if k % self.magnification != 0 {
            return Err(DensityError::RepetitionNotMultiple {
                k,
                magnification: self.magnification,
            });
        }
        Ok(())
    }

    /// Map a measurement angle and repetition count into the contracted
    /// domain: `(θ - k·φ₀, k / M)`.
    pub(crate) fn contracted_setting(&self, angle: f64, k: usize) -> Result<(f64, usize)> {
        if self.magnification == 1 {
            return Ok((angle, k));
        }
        self.check_repetition(k)?;
        Ok((
            angle - k as f64 * self.offset,
            k / self.magnification,
        ))
    }

    pub(crate) fn is_informative(&self, k: usize) -> bool {
        self.model.is_informative(k, self.tolerances.epsilon)
    }

    // =========================================================================
    // Bayesian update
    // =========================================================================

    /// Incorporate the outcome of a measurement with feedback angle `angle`
    /// and repetition count `k`.
    ///
    /// Raises the truncation order to `min(N + k/M, N_max)`. A measurement
    /// whose contrast or symmetry is at or below epsilon is a no-op.
    ///
    /// # Errors
    ///
    /// `k` outside `[1, K]` or not a multiple of the magnification, or a
    /// vanishing marginal probability of the observed outcome.
    pub fn update(&mut self, outcome: Outcome, angle: f64, k: usize) -> Result<()> {
        self.check_repetition(k)?;
        if !self.is_informative(k) {
            return Ok(());
        }

        let xi = outcome.sign();
        let lambda = self.model.symmetry(k);
        let xi_lz = xi * lambda * self.model.contrast(k);
        let one_xi = 1.0 + xi * (1.0 - lambda);

        let (angle, km) = self.contracted_setting(angle, k)?;
        let e = phasor(angle);
        let ck = self.dense().coeff(km)?;

        let a0 = one_xi + xi_lz * re_mul(ck, e);
        if a0 <= 0.0 {
            return Err(DensityError::NumericLimit {
                quantity: "posterior normalization",
            });
        }

        let order = self.order;
        let n_new = (order + km).min(self.n_max);
        let prior: Vec<Complex64> = self.coeffs[..=order].iter().map(|&c| c / a0).collect();
        self.coeffs[0] = C_ONE;
        for c in &mut self.coeffs[1..=n_new] {
            *c = C_ZERO;
        }

        for n in 1..=order {
            self.coeffs[n] += one_xi * prior[n];
        }

        let up = e * (xi_lz / 2.0);
        let down = up.conj();
        if order > km {
            for n in 1..=order - km {
                self.coeffs[n] += up * prior[n + km];
            }
        }
        if km >= 2 {
            let first = km.saturating_sub(order).max(1);
            for n in first..=(km - 1).min(n_new) {
                self.coeffs[n] += down * prior[km - n].conj();
            }
        }
        for n in km..=n_new {
            self.coeffs[n] += down * prior[n - km];
        }

        self.order = n_new;
        Ok(())
    }

    /// Set coefficient `c_n = mag·e^{i·phase}` and the truncation order.
    pub fn set_harmonic(&mut self, n: usize, mag: f64, phase: f64, order: usize) -> Result<()> {
        if mag > 1.0 {
            return Err(DensityError::HarmonicMagnitude(mag));
        }
        if n == 0 || n > self.n_max {
            return Err(DensityError::IndexOutOfRange {
                index: n,
                max: self.n_max,
            });
        }
        if order > self.n_max {
            return Err(DensityError::IndexOutOfRange {
                index: order,
                max: self.n_max,
            });
        }
        self.coeffs[n] = Complex64::from_polar(mag, phase);
        self.order = order;
        Ok(())
    }

    // =========================================================================
    // Evaluation and estimates
    // =========================================================================

    /// Density at represented angle `angle`.
    pub fn density(&self, angle: f64) -> f64 {
        let e = phasor(angle);
        let mut twice_en = Complex64::new(2.0, 0.0);
        let mut value = self.coeffs[0].re;
        for c in &self.coeffs[1..=self.order] {
            twice_en *= e;
            value += re_mul(*c, twice_en);
        }
        value
    }

    /// Density at true phase `phase`, scaled to the full circle.
    ///
    /// Zero outside the contracted range. Membership is decided by the sign
    /// of cross products between the range bounds and the query phasor, which
    /// avoids modulo artifacts at the seam; ranges of π or more are not
    /// supported.
    pub fn scaled_density(&self, phase: f64) -> f64 {
        if self.magnification == 1 {
            return self.density(phase);
        }
        let m = self.magnification as f64;
        let phase = wrap_two_pi(phase);
        let p = phasor(phase);
        let start = phasor(self.offset);
        let end = phasor(self.offset + TAU / m);
        if cross(start, p) >= 0.0 && cross(p, end) >= 0.0 {
            m * self.density(m * wrap_two_pi(phase - self.offset))
        } else {
            0.0
        }
    }

    /// Mean phase estimate `φ₀ + ((-arg c₁) mod 2π)/M`.
    pub fn phase_estimate(&self) -> Result<f64> {
        if self.order < 1 {
            return Err(DensityError::UniformDensity {
                quantity: "phase estimate",
            });
        }
        Ok(self.from_represented(wrap_two_pi(-self.coeffs[1].arg())))
    }

    /// Mode of the density, searched within one standard deviation of the mean.
    pub fn peak_estimate(&self) -> Result<f64> {
        if self.order < 1 {
            return Err(DensityError::UniformDensity {
                quantity: "peak phase estimate",
            });
        }
        let mean = -self.coeffs[1].arg();
        let sharpness = self.coeffs[1].norm_sqr();
        let std = if sharpness < self.tolerances.small {
            PI
        } else {
            sqrt(1.0 / sharpness - 1.0).min(PI)
        };
        let peak = brent_minimize(
            |angle| Ok(-self.density(angle)),
            mean - std,
            mean + std,
            self.tolerances.peak_precision_bits,
        )?;
        Ok(self.from_represented(wrap_two_pi(peak.x)))
    }

    fn from_represented(&self, theta: f64) -> f64 {
        wrap_two_pi(self.offset + theta / self.magnification as f64)
    }

    /// Holevo-style variance `(1/|c₁|² - 1)/M²`.
    ///
    /// `f64::MAX` for a uniform density and the `large` tolerance when `|c₁|`
    /// has vanished.
    pub fn variance(&self) -> f64 {
        if self.order < 1 {
            return f64::MAX;
        }
        let sharpness = self.coeffs[1].norm_sqr();
        if sharpness < self.tolerances.small {
            return self.tolerances.large;
        }
        (1.0 / sharpness - 1.0) / sq(self.magnification as f64)
    }

    // =========================================================================
    // Reshaping
    // =========================================================================

    /// Rotate the density by `delta`: `c_n ← c_n e^{-inΔ}`.
    pub fn shift(&mut self, delta: f64) {
        rotate(&mut self.coeffs[..=self.order], delta);
    }

    /// Raise each coefficient's magnitude to the power `r²`, keeping its phase.
    pub fn spread(&mut self, r: f64) -> Result<()> {
        if r.is_nan() || r <= 0.0 {
            return Err(DensityError::NonPositiveSpread(r));
        }
        let r2 = r * r;
        for c in &mut self.coeffs[1..=self.order] {
            let mag = c.norm();
            if mag > SPREAD_FLOOR {
                *c *= pow(mag, r2) / mag;
            } else {
                *c = C_ZERO;
            }
        }
        Ok(())
    }

    /// Reset to the uniform density, optionally also resetting the
    /// magnification to 1 and the offset to 0.
    pub fn set_uniform(&mut self, reset_magnification: bool) {
        self.order = 0;
        self.coeffs[0] = C_ONE;
        for c in &mut self.coeffs[1..] {
            *c = C_ZERO;
        }
        if reset_magnification {
            self.magnification = 1;
            self.offset = 0.0;
        }
    }

    /// Set a wrapped normal density with the given mean and standard
    /// deviation in the represented domain.
    ///
    /// `c_n = exp(-n²σ²/2)·e^{-inμ}`; the series stops at the first
    /// coefficient whose magnitude is not above the `small` tolerance.
    pub fn set_gaussian(&mut self, mean: f64, std: f64) {
        let half_var = sq(std) / 2.0;
        let e = phasor(-mean);
        let mut en = C_ONE;
        self.coeffs[0] = C_ONE;
        self.order = self.n_max;
        for n in 1..=self.n_max {
            let mag = exp(-sq(n as f64) * half_var);
            if mag > self.tolerances.small {
                en *= e;
                self.coeffs[n] = en * mag;
            } else {
                self.order = n - 1;
                break;
            }
        }
        let order = self.order;
        for c in &mut self.coeffs[order + 1..] {
            *c = C_ZERO;
        }
    }
}

/// Saved truncation order and leading coefficients of a density.
#[derive(Debug, Clone)]
pub(crate) struct Snapshot {
    order: usize,
    coeffs: Vec<Complex64>,
}

impl PhaseDensity {
    pub(crate) fn snapshot(&self) -> Snapshot {
        Snapshot {
            order: self.order,
            coeffs: self.coeffs[..=self.order].to_vec(),
        }
    }

    /// Return to a snapshot taken from this density.
    pub(crate) fn restore(&mut self, snapshot: &Snapshot) {
        let top = self.order.max(snapshot.order);
        self.coeffs[..=snapshot.order].copy_from_slice(&snapshot.coeffs);
        for c in &mut self.coeffs[snapshot.order + 1..=top] {
            *c = C_ZERO;
        }
        self.order = snapshot.order;
    }
}

/// `c_n ← c_n e^{-inΔ}` for every n.
pub(crate) fn rotate(coeffs: &mut [Complex64], delta: f64) {
    let e = phasor(-delta);
    let mut en = C_ONE;
    for c in coeffs.iter_mut().skip(1) {
        en *= e;
        *c *= en;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Outcome::{One, Zero};

    fn ideal(n_max: usize, k_max: usize) -> PhaseDensity {
        PhaseDensity::new(n_max, k_max).unwrap()
    }

    fn mean_density(d: &PhaseDensity) -> f64 {
        let steps = 4096;
        (0..steps)
            .map(|i| d.density(TAU * i as f64 / steps as f64))
            .sum::<f64>()
            / steps as f64
    }

    #[test]
    fn construction_validates() {
        assert_eq!(
            PhaseDensity::new(4, 0),
            Err(DensityError::InvalidMaxRepetition { k_max: 0, n_max: 4 })
        );
        assert_eq!(
            PhaseDensity::new(4, 5),
            Err(DensityError::InvalidMaxRepetition { k_max: 5, n_max: 4 })
        );
        assert_eq!(
            PhaseDensity::with_magnification(8, 2, 0, 0.0),
            Err(DensityError::InvalidMagnification(0))
        );
        let d = PhaseDensity::with_magnification(8, 2, 2, -0.5).unwrap();
        assert!((d.offset() - (TAU - 0.5)).abs() < 1e-12);
        assert_eq!(d.order(), 0);
        assert_eq!(d.coefficients(), &[C_ONE]);
    }

    #[test]
    fn uniform_density_is_flat() {
        let d = ideal(8, 1);
        assert_eq!(d.density(0.3), 1.0);
        assert_eq!(d.variance(), f64::MAX);
        assert!(matches!(
            d.phase_estimate(),
            Err(DensityError::UniformDensity { .. })
        ));
        assert!(d.peak_estimate().is_err());
    }

    #[test]
    fn first_update_from_uniform() {
        // Outcome 0 at angle 0, ideal model: density ∝ 1 + cos φ, so c₁ = 1/2.
        let mut d = ideal(8, 1);
        d.update(Zero, 0.0, 1).unwrap();
        assert_eq!(d.order(), 1);
        assert!((d.harmonic(1).unwrap() - Complex64::new(0.5, 0.0)).norm() < 1e-15);
        assert!((d.density(0.0) - 2.0).abs() < 1e-12);
        assert!(d.density(PI).abs() < 1e-12);
    }

    #[test]
    fn update_validates_repetition() {
        let mut d = ideal(8, 2);
        assert_eq!(
            d.update(Zero, 0.0, 3),
            Err(DensityError::InvalidRepetition { k: 3, k_max: 2 })
        );
        assert_eq!(
            d.update(Zero, 0.0, 0),
            Err(DensityError::InvalidRepetition { k: 0, k_max: 2 })
        );
        let mut m = PhaseDensity::with_magnification(8, 4, 2, 0.0).unwrap();
        assert_eq!(
            m.update(One, 0.0, 3),
            Err(DensityError::RepetitionNotMultiple {
                k: 3,
                magnification: 2
            })
        );
    }

    #[test]
    fn order_is_capped() {
        let mut d = ideal(4, 3);
        d.update(Zero, 0.2, 3).unwrap();
        d.update(One, 1.0, 3).unwrap();
        assert_eq!(d.order(), 4);
        assert_eq!(d.coefficients()[0], C_ONE);
    }

    #[test]
    fn uninformative_update_is_noop() {
        let mut d = ideal(16, 2);
        d.set_gaussian(1.0, 0.5);
        d.set_contrasts(&[1.0, 0.0]).unwrap();
        let before = d.clone();
        d.update(Zero, 0.4, 2).unwrap();
        d.update(One, 2.4, 2).unwrap();
        assert_eq!(d, before);
    }

    #[test]
    fn gaussian_scenario() {
        let mut d = ideal(32, 4);
        d.set_contrasts(&[1.0; 4]).unwrap();
        d.set_symmetries(&[1.0; 4]).unwrap();
        d.set_gaussian(PI, 0.2);
        assert!((d.phase_estimate().unwrap() - PI).abs() < 1e-3);
        let before = d.variance();
        assert!((before - 0.04).abs() < 2e-3);
        d.update(Zero, PI, 1).unwrap();
        assert!(d.variance() < before);
    }

    #[test]
    fn gaussian_coefficients() {
        let mut d = ideal(32, 1);
        d.set_gaussian(1.0, 0.2);
        for n in 1..=4 {
            let nf = n as f64;
            let expected = Complex64::from_polar((-nf * nf * 0.02).exp(), -nf);
            assert!((d.harmonic(n).unwrap() - expected).norm() < 1e-12);
        }
        // |c₁| = exp(-σ²/2)
        assert!((d.harmonic(1).unwrap().norm() - 0.9801986733067553).abs() < 1e-14);
    }

    #[test]
    fn gaussian_truncates_small_coefficients() {
        let mut d = ideal(400, 1);
        d.set_gaussian(0.0, 1.0);
        // exp(-n²/2) drops below sqrt(f64::MIN_POSITIVE) at n = 27.
        assert_eq!(d.order(), 26);
        assert_eq!(d.harmonic(27).unwrap(), C_ZERO);
    }

    #[test]
    fn peak_matches_mean_for_symmetric_density() {
        let mut d = ideal(32, 1);
        d.set_gaussian(2.0, 0.3);
        assert!((d.peak_estimate().unwrap() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn shift_moves_estimate() {
        let mut d = ideal(32, 1);
        d.set_gaussian(1.0, 0.4);
        d.shift(0.25);
        assert!((d.phase_estimate().unwrap() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn spread_widens() {
        let mut d = ideal(32, 1);
        d.set_gaussian(1.0, 0.3);
        let before = d.variance();
        d.spread(1.5).unwrap();
        assert!(d.variance() > before);
        assert!((d.phase_estimate().unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(d.spread(0.0), Err(DensityError::NonPositiveSpread(0.0)));
        assert!(d.spread(f64::NAN).is_err());
    }

    #[test]
    fn set_harmonic_validates() {
        let mut d = ideal(8, 1);
        assert_eq!(
            d.set_harmonic(1, 1.5, 0.0, 1),
            Err(DensityError::HarmonicMagnitude(1.5))
        );
        assert!(d.set_harmonic(1, 0.5, 0.0, 9).is_err());
        assert!(d.set_harmonic(0, 0.5, 0.0, 1).is_err());
        d.set_harmonic(1, 0.5, -0.3, 1).unwrap();
        assert!((d.phase_estimate().unwrap() - 0.3).abs() < 1e-12);
        assert!(d.harmonic(9).is_err());
    }

    #[test]
    fn scaled_density_respects_range() {
        let mut d = PhaseDensity::with_magnification(32, 2, 4, 1.0).unwrap();
        d.set_gaussian(PI, 0.5);
        let inside = 1.0 + PI / 8.0;
        assert!((d.scaled_density(inside) - 4.0 * d.density(PI / 2.0)).abs() < 1e-12);
        assert_eq!(d.scaled_density(1.0 + PI), 0.0);
        assert_eq!(d.scaled_density(0.9), 0.0);
    }

    #[test]
    fn contracted_estimates_scale() {
        let mut d = PhaseDensity::with_magnification(32, 2, 2, 0.5).unwrap();
        d.set_gaussian(PI, 0.2);
        assert!((d.phase_estimate().unwrap() - (0.5 + PI / 2.0)).abs() < 1e-12);
        let v = d.variance();
        let mut full = ideal(32, 1);
        full.set_gaussian(PI, 0.2);
        assert!((v - full.variance() / 4.0).abs() < 1e-15);
    }

    #[test]
    fn normalization_after_updates() {
        let mut d = ideal(64, 4);
        d.set_symmetries(&[0.9, 0.95, 1.0, 0.8]).unwrap();
        d.set_contrasts(&[0.95, 0.9, 0.85, 0.9]).unwrap();
        let shots = [(Zero, 0.3, 1), (One, 1.2, 2), (Zero, 2.0, 4), (One, 0.1, 3)];
        for (outcome, angle, k) in shots {
            d.update(outcome, angle, k).unwrap();
            assert_eq!(d.coefficients()[0], C_ONE);
            assert!((mean_density(&d) - 1.0).abs() < 1e-12);
        }
    }
}
