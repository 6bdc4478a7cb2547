//! Result types of an estimation session.

use std::fmt;

use serde::{Deserialize, Serialize};
use tape_core::Outcome;

/// Why an estimation session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The phase variance reached the configured target.
    TargetVariance,
    /// The measurement budget was spent.
    MeasurementBudget,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::TargetVariance => write!(f, "target variance reached"),
            StopReason::MeasurementBudget => write!(f, "measurement budget spent"),
        }
    }
}

/// One recorded measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotRecord {
    /// Position in the session, from 0.
    pub index: usize,
    /// Repetition count.
    pub k: usize,
    /// Feedback angle in radians.
    pub angle: f64,
    /// Observed outcome.
    pub outcome: Outcome,
    /// Phase variance after the update.
    pub variance: f64,
}

/// Summary of a finished estimation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationReport {
    /// Mean phase estimate in `[0, 2π)`.
    pub estimate: f64,

    /// Mode of the posterior density in `[0, 2π)`.
    pub peak_estimate: f64,

    /// Holevo-style phase variance of the posterior.
    pub variance: f64,

    /// Number of measurements taken.
    pub measurements: usize,

    /// Sum of the repetition counts of all measurements.
    ///
    /// This is the resource count of the session.
    pub total_repetitions: usize,

    /// Why the session stopped.
    pub stop_reason: StopReason,

    /// Every measurement in order.
    pub history: Vec<ShotRecord>,
}

impl EstimationReport {
    /// Standard deviation of the phase, `sqrt(variance)`.
    pub fn std_dev(&self) -> f64 {
        self.variance.sqrt()
    }

    /// Whether the session reached its target variance.
    pub fn converged(&self) -> bool {
        self.stop_reason == StopReason::TargetVariance
    }
}
