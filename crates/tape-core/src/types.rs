//! Core value types shared by the density, gain and search modules.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::DensityError;

/// Complex coefficient type.
pub type Complex64 = num_complex::Complex64;

/// Complex zero.
pub const C_ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// Complex one.
pub const C_ONE: Complex64 = Complex64::new(1.0, 0.0);

/// Result of a two-outcome measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Outcome 0 (ξ = +1).
    Zero,
    /// Outcome 1 (ξ = -1).
    One,
}

impl Outcome {
    /// Both outcomes, in order.
    pub const ALL: [Outcome; 2] = [Outcome::Zero, Outcome::One];

    /// The sign ξ = 1 - 2·outcome.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Outcome::Zero => 1.0,
            Outcome::One => -1.0,
        }
    }
}

impl TryFrom<u8> for Outcome {
    type Error = DensityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Outcome::Zero),
            1 => Ok(Outcome::One),
            other => Err(DensityError::InvalidOutcome(other)),
        }
    }
}

impl From<Outcome> for u8 {
    fn from(outcome: Outcome) -> u8 {
        match outcome {
            Outcome::Zero => 0,
            Outcome::One => 1,
        }
    }
}

/// Objective maximised when choosing a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GainKind {
    /// Expected reduction of differential entropy.
    #[default]
    Entropy,
    /// Expected reduction of the `1/|c₁|²` variance proxy.
    Variance,
    /// Expected increase of `|c₁|`.
    Sharpness,
}

/// Envelope used when upsampling a density into a finer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpansionKind {
    /// Flat envelope: zero-fill between known coefficients.
    Uniform,
    /// Gaussian envelope centred on the incoming density's range.
    Gaussian,
    /// Gaussian envelope centred on this density's own mean.
    GaussianSelfMean,
    /// This density's current coefficients act as the envelope.
    SelfEnvelope,
}

/// A feedback angle together with the gain it achieves.
///
/// Compared by gain only.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GainPoint {
    /// Feedback angle in `[0, π)`.
    pub angle: f64,
    /// Gain at that angle.
    pub gain: f64,
}

impl GainPoint {
    /// Create a gain point.
    pub fn new(angle: f64, gain: f64) -> Self {
        Self { angle, gain }
    }
}

impl PartialEq for GainPoint {
    fn eq(&self, other: &Self) -> bool {
        self.gain == other.gain
    }
}

impl PartialOrd for GainPoint {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.gain.partial_cmp(&other.gain)
    }
}

/// Chosen measurement settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotSetting {
    /// Feedback angle in radians.
    pub angle: f64,
    /// Repetition count.
    pub k: usize,
}
