//! # tape
//!
//! Adaptive Bayesian phase estimation.
//!
//! A phase φ is probed by two-outcome measurements with a chosen repetition
//! count k and feedback angle θ. The posterior over φ is a truncated Fourier
//! series updated exactly after every outcome, and each measurement is chosen
//! to maximise an expected information gain, optionally planning several
//! measurements ahead.
//!
//! ## Quick Start
//!
//! ```
//! use tape::{PhaseEstimator, SimulatedPhase};
//!
//! let mut source = SimulatedPhase::new(0.7);
//! let report = PhaseEstimator::quick()
//!     .session()
//!     .unwrap()
//!     .run(|shot| source.measure(shot))
//!     .unwrap();
//!
//! println!("{}", tape::output::format_report(&report));
//! ```
//!
//! The engine lives in [`tape_core`] and is re-exported here for direct use
//! of densities, gains and resampling.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod error;
mod estimator;
mod result;

pub mod helpers;
pub mod output;

pub use config::Config;
pub use error::EstimatorError;
pub use estimator::{AdaptiveSession, PhaseEstimator};
pub use helpers::SimulatedPhase;
pub use result::{EstimationReport, ShotRecord, StopReason};

pub use tape_core;
pub use tape_core::{
    DensityError, ExpansionKind, GainKind, GainPoint, LookaheadPlan, Outcome, PhaseDensity,
    ShotSetting, Tolerances,
};
