//! Error type of the estimation driver.

use std::fmt;

use tape_core::DensityError;

/// Failure of an estimation session.
#[derive(Debug, Clone, PartialEq)]
pub enum EstimatorError {
    /// The phase density rejected an operation.
    Density(DensityError),
    /// A candidate repetition count exceeds the measurement model's K.
    CandidateOutOfRange {
        /// The candidate.
        k: usize,
        /// Largest repetition count of the model.
        k_max: usize,
    },
    /// The configuration lists no candidate repetition counts.
    NoCandidates,
}

impl fmt::Display for EstimatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimatorError::Density(err) => write!(f, "density error: {}", err),
            EstimatorError::CandidateOutOfRange { k, k_max } => write!(
                f,
                "candidate repetition count {} exceeds the largest configured count {}",
                k, k_max
            ),
            EstimatorError::NoCandidates => write!(f, "no candidate repetition counts"),
        }
    }
}

impl std::error::Error for EstimatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EstimatorError::Density(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DensityError> for EstimatorError {
    fn from(err: DensityError) -> Self {
        EstimatorError::Density(err)
    }
}
