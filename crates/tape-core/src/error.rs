//! Error type for density, gain and search operations.

use core::fmt;

/// Failure of a density or search operation.
///
/// Every failure is deterministic given the same inputs; nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum DensityError {
    /// Repetition count outside `[1, K]`.
    InvalidRepetition {
        /// Requested repetition count.
        k: usize,
        /// Largest allowed repetition count.
        k_max: usize,
    },

    /// Repetition count is not a multiple of the current magnification.
    RepetitionNotMultiple {
        /// Requested repetition count.
        k: usize,
        /// Current magnification.
        magnification: usize,
    },

    /// Outcome value other than 0 or 1.
    InvalidOutcome(u8),

    /// Maximum repetition count outside `[1, N_max]`.
    InvalidMaxRepetition {
        /// Requested K.
        k_max: usize,
        /// Coefficient capacity.
        n_max: usize,
    },

    /// A per-k parameter vector does not have K entries.
    LengthMismatch {
        /// Which parameter vector.
        parameter: &'static str,
        /// Number of entries given.
        given: usize,
        /// Expected number of entries (K).
        expected: usize,
    },

    /// A contrast or symmetry outside `[0, 1]`.
    OutOfUnitInterval {
        /// Which parameter vector.
        parameter: &'static str,
        /// Offending value.
        value: f64,
    },

    /// A zero weight, which cannot rank candidates.
    InvalidWeight {
        /// Repetition count carrying the weight.
        k: usize,
    },

    /// Magnification below 1.
    InvalidMagnification(usize),

    /// Target magnification is not a proper multiple of the source's.
    InvalidContraction {
        /// Source magnification.
        source: usize,
        /// Requested magnification.
        target: usize,
    },

    /// Source magnification is not a multiple of the target's.
    InvalidExpansion {
        /// Source magnification.
        source: usize,
        /// Target magnification.
        target: usize,
    },

    /// The expanded density's range is not inside this density's range.
    ExpansionOutOfRange,

    /// Coefficient index beyond the capacity.
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Largest valid index.
        max: usize,
    },

    /// A quantity that is undefined for a uniform density (N = 0).
    UniformDensity {
        /// The quantity that was requested.
        quantity: &'static str,
    },

    /// A computation hit a vanished denominator.
    NumericLimit {
        /// The quantity being computed.
        quantity: &'static str,
    },

    /// A coefficient subset was asked for an index it does not hold.
    MissingIndex(usize),

    /// Subset indices are not strictly increasing.
    UnsortedIndices,

    /// Harmonic magnitude above 1.
    HarmonicMagnitude(f64),

    /// Spread factor not strictly positive.
    NonPositiveSpread(f64),

    /// Multi-shot gain needs at least two shots.
    TooFewShots(usize),

    /// Shot search was given no candidate repetition counts.
    NoCandidates,

    /// Discrete search was given no points.
    EmptySearch,
}

impl fmt::Display for DensityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DensityError::InvalidRepetition { k, k_max } => {
                write!(f, "Invalid repetition count {}: must be in [1, {}]", k, k_max)
            }
            DensityError::RepetitionNotMultiple { k, magnification } => write!(
                f,
                "Invalid repetition count for a magnification of {}: {} is not a multiple of {}",
                magnification, k, magnification
            ),
            DensityError::InvalidOutcome(outcome) => {
                write!(f, "Invalid outcome {} (must be 0 or 1)", outcome)
            }
            DensityError::InvalidMaxRepetition { k_max, n_max } => write!(
                f,
                "Invalid maximum repetition count {}: must be in [1, {}]",
                k_max, n_max
            ),
            DensityError::LengthMismatch {
                parameter,
                given,
                expected,
            } => write!(
                f,
                "{} has {} entries, expected one per repetition count ({})",
                parameter, given, expected
            ),
            DensityError::OutOfUnitInterval { parameter, value } => {
                write!(f, "{} must be in [0, 1], got {}", parameter, value)
            }
            DensityError::InvalidWeight { k } => {
                write!(f, "Weight for repetition count {} must be non-zero", k)
            }
            DensityError::InvalidMagnification(m) => {
                write!(f, "Magnification must be at least 1, got {}", m)
            }
            DensityError::InvalidContraction { source, target } => write!(
                f,
                "Invalid contraction: {} is not a proper multiple of {}",
                target, source
            ),
            DensityError::InvalidExpansion { source, target } => write!(
                f,
                "Invalid expansion: magnification {} is not a multiple of {}",
                source, target
            ),
            DensityError::ExpansionOutOfRange => {
                write!(f, "Invalid expansion: other density out of range")
            }
            DensityError::IndexOutOfRange { index, max } => {
                write!(f, "Coefficient index {} out of range [0, {}]", index, max)
            }
            DensityError::UniformDensity { quantity } => write!(
                f,
                "The {} is undefined for a uniform density; with a uniform prior use the \
                 smallest repetition count at any angle",
                quantity
            ),
            DensityError::NumericLimit { quantity } => write!(
                f,
                "Numeric limits reached: {} cannot be computed accurately",
                quantity
            ),
            DensityError::MissingIndex(index) => {
                write!(f, "Coefficient subset has no index {}", index)
            }
            DensityError::UnsortedIndices => {
                write!(f, "Coefficient subset indices must be strictly increasing")
            }
            DensityError::HarmonicMagnitude(mag) => {
                write!(f, "Harmonic magnitude {} is larger than one", mag)
            }
            DensityError::NonPositiveSpread(r) => {
                write!(f, "Spread factor must be positive, got {}", r)
            }
            DensityError::TooFewShots(n) => {
                write!(f, "Multi-shot gain requires at least 2 shots, got {}", n)
            }
            DensityError::NoCandidates => write!(f, "No candidate repetition counts"),
            DensityError::EmptySearch => write!(f, "No values to search"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DensityError {}

/// Result alias for density operations.
pub type Result<T> = core::result::Result<T, DensityError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn display_messages() {
        let err = DensityError::InvalidRepetition { k: 5, k_max: 4 };
        assert_eq!(err.to_string(), "Invalid repetition count 5: must be in [1, 4]");

        let err = DensityError::UniformDensity {
            quantity: "phase estimate",
        };
        assert!(err.to_string().contains("uniform density"));

        let err = DensityError::RepetitionNotMultiple {
            k: 3,
            magnification: 2,
        };
        assert!(err.to_string().contains("3 is not a multiple of 2"));
    }
}
