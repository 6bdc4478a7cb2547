//! Two-outcome measurement model and the per-k constants of the entropy gain.
//!
//! For repetition count k with contrast z and symmetry λ the likelihood of
//! outcome ξ (ξ = +1 for outcome 0) at feedback angle θ is
//!
//! ```text
//! L(ξ | φ) = (1 + ξ(1 - λ) + ξ λ z cos(kφ - θ)) / 2
//! ```

use alloc::vec;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::constants::TWO_LN_2;
use crate::error::{DensityError, Result};
use crate::math::{ln, sq, sqrt};

/// Constants of the closed-form entropy gain for one repetition count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KConstants {
    /// sqrt(1 - z²)
    pub x: f64,
    /// sqrt(1 - δ²) with δ = λz / (2 - λ)
    pub y: f64,
    /// 1 / (1 + x)
    pub u: f64,
    /// 1 / (1 + y)
    pub v: f64,
    /// x·u
    pub xu: f64,
    /// y·v
    pub yv: f64,
    /// z²u²
    pub zu2: f64,
    /// δ²v²
    pub dv2: f64,
    /// Angle-independent part of the entropy gain.
    pub dh0: f64,
    /// Weight of the first harmonic term (zero when λ = 1).
    pub b1: f64,
}

impl KConstants {
    /// Derive the constants for contrast `z` and symmetry `lambda`.
    pub fn new(z: f64, lambda: f64, epsilon: f64) -> Self {
        let two_ml = 2.0 - lambda;
        let delta = lambda * z / two_ml;
        let z2 = sq(z);
        let d2 = sq(delta);
        let x = sqrt(1.0 - z2);
        let y = sqrt(1.0 - d2);
        let one_px = 1.0 + x;
        let one_py = 1.0 + y;
        let u = 1.0 / one_px;
        let v = 1.0 / one_py;

        let (dh0, b1) = if lambda <= epsilon {
            (0.0, 0.0)
        } else {
            let one_ml = 1.0 - lambda;
            let ln_one_px = ln(one_px);
            let ln_one_py = ln(one_py);
            let ln_ratio = ln(two_ml / lambda);
            let dh0 = -TWO_LN_2
                + 0.5 * ln(1.0 - one_ml * one_ml)
                + 0.5 * one_ml * ln_ratio
                + 0.5 * two_ml * (d2 * v + ln_one_py)
                + 0.5 * lambda * (z2 * u + ln_one_px);
            let b1 = if lambda >= 1.0 - epsilon {
                0.0
            } else {
                0.5 * lambda * z * (ln_ratio + ln_one_py - ln_one_px + v - u)
            };
            (dh0, b1)
        };

        Self {
            x,
            y,
            u,
            v,
            xu: x * u,
            yv: y * v,
            zu2: z2 * u * u,
            dv2: d2 * v * v,
            dh0,
            b1,
        }
    }
}

/// Coefficient of the even-harmonic entropy series, `1 / (n(4n² - 1))`.
#[inline]
pub fn a_i(n: usize) -> f64 {
    let n = n as f64;
    1.0 / (n * (4.0 * n * n - 1.0))
}

/// Coefficient of the even-harmonic entropy series, `2 / (4n² - 1)`.
#[inline]
pub fn a_ii(n: usize) -> f64 {
    let n = n as f64;
    2.0 / (4.0 * n * n - 1.0)
}

/// Coefficient of the odd-harmonic entropy series, `1 / (n(n - 1)(2n - 1))`, n ≥ 2.
#[inline]
pub fn b_i(n: usize) -> f64 {
    let n = n as f64;
    1.0 / (n * (n - 1.0) * (2.0 * n - 1.0))
}

/// Coefficient of the odd-harmonic entropy series, `1 / (n(n - 1))`, n ≥ 2.
#[inline]
pub fn b_ii(n: usize) -> f64 {
    let n = n as f64;
    1.0 / (n * (n - 1.0))
}

/// Per-repetition-count contrasts, symmetries and weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementModel {
    contrasts: Vec<f64>,
    symmetries: Vec<f64>,
    weights: Vec<f64>,
    constants: Vec<KConstants>,
}

impl MeasurementModel {
    /// Model for `k_max` repetition counts with every parameter set to one.
    pub fn new(k_max: usize, epsilon: f64) -> Self {
        let mut model = Self {
            contrasts: vec![1.0; k_max],
            symmetries: vec![1.0; k_max],
            weights: vec![1.0; k_max],
            constants: Vec::new(),
        };
        model.refresh(epsilon);
        model
    }

    /// Largest repetition count K.
    pub fn k_max(&self) -> usize {
        self.contrasts.len()
    }

    /// Contrasts z_k, index k - 1.
    pub fn contrasts(&self) -> &[f64] {
        &self.contrasts
    }

    /// Symmetries λ_k, index k - 1.
    pub fn symmetries(&self) -> &[f64] {
        &self.symmetries
    }

    /// Weights w_k, index k - 1.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Contrast of repetition count `k` (1-based, unchecked range).
    #[inline]
    pub fn contrast(&self, k: usize) -> f64 {
        self.contrasts[k - 1]
    }

    /// Symmetry of repetition count `k`.
    #[inline]
    pub fn symmetry(&self, k: usize) -> f64 {
        self.symmetries[k - 1]
    }

    /// Weight of repetition count `k`.
    #[inline]
    pub fn weight(&self, k: usize) -> f64 {
        self.weights[k - 1]
    }

    /// Entropy-gain constants of repetition count `k`.
    #[inline]
    pub fn constants(&self, k: usize) -> &KConstants {
        &self.constants[k - 1]
    }

    /// Whether a measurement with repetition count `k` carries information.
    #[inline]
    pub fn is_informative(&self, k: usize, epsilon: f64) -> bool {
        self.contrast(k) > epsilon && self.symmetry(k) > epsilon
    }

    pub(crate) fn set_contrasts(&mut self, z: &[f64], epsilon: f64) -> Result<()> {
        self.check_unit_values("contrasts", z)?;
        self.contrasts = z.to_vec();
        self.refresh(epsilon);
        Ok(())
    }

    pub(crate) fn set_symmetries(&mut self, lambda: &[f64], epsilon: f64) -> Result<()> {
        self.check_unit_values("symmetries", lambda)?;
        self.symmetries = lambda.to_vec();
        self.refresh(epsilon);
        Ok(())
    }

    pub(crate) fn set_weights(&mut self, w: &[f64]) -> Result<()> {
        self.check_length("weights", w)?;
        if let Some(k) = w.iter().position(|&v| v == 0.0 || v.is_nan()) {
            return Err(DensityError::InvalidWeight { k: k + 1 });
        }
        self.weights = w.to_vec();
        Ok(())
    }

    /// Recompute the per-k constants.
    pub(crate) fn refresh(&mut self, epsilon: f64) {
        self.constants = self
            .contrasts
            .iter()
            .zip(&self.symmetries)
            .map(|(&z, &lambda)| KConstants::new(z, lambda, epsilon))
            .collect();
    }

    fn check_length(&self, parameter: &'static str, values: &[f64]) -> Result<()> {
        if values.len() != self.k_max() {
            return Err(DensityError::LengthMismatch {
                parameter,
                given: values.len(),
                expected: self.k_max(),
            });
        }
        Ok(())
    }

    fn check_unit_values(&self, parameter: &'static str, values: &[f64]) -> Result<()> {
        self.check_length(parameter, values)?;
        match values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            Some(&value) => Err(DensityError::OutOfUnitInterval { parameter, value }),
            None => Ok(()),
        }
    }
}
