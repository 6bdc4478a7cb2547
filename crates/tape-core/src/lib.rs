//! Adaptive phase estimation over truncated Fourier-series densities.
//!
//! This crate provides the estimation engine: a phase density updated by
//! Bayes' rule after each two-outcome measurement, closed-form expected
//! gains (entropy, variance, sharpness), optimisation of the next
//! measurement's angle and repetition count, a multi-shot lookahead over the
//! outcome tree, and resampling of densities between magnifications. It
//! works in `no_std` environments with only an allocator.
//!
//! # Features
//!
//! - `std` (default): Enable standard library support (`std::error::Error`)
//! - `parallel`: Score shot candidates in parallel using rayon (requires `std`)
//!
//! # Usage
//!
//! This crate is typically used through the main `tape` crate, which
//! provides configuration presets, the adaptive measurement loop and output
//! formatting.
//!
//! ```
//! use tape_core::{GainKind, Outcome, PhaseDensity};
//!
//! let mut density = PhaseDensity::new(64, 4).unwrap();
//! density.update(Outcome::Zero, 0.0, 1).unwrap();
//! let best = density.best_gain_angle(2, GainKind::Entropy).unwrap();
//! density.update(Outcome::One, best.angle, 2).unwrap();
//! let estimate = density.phase_estimate().unwrap();
//! assert!((0.0..core::f64::consts::TAU).contains(&estimate));
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod config;
pub mod constants;
pub mod density;
pub mod error;
pub mod gain;
pub mod math;
pub mod search;
pub mod types;

// Re-export commonly used items at crate root
pub use config::Tolerances;
pub use density::{CoeffSource, CoeffSubset, DenseCoeffs, MeasurementModel, PhaseDensity};
pub use error::{DensityError, Result};
pub use gain::LookaheadPlan;
pub use types::{
    Complex64, ExpansionKind, GainKind, GainPoint, Outcome, ShotSetting, C_ONE, C_ZERO,
};
