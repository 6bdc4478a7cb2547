//! Numeric tolerances carried by each density instance.

use serde::{Deserialize, Serialize};

use crate::constants::{
    ANGLE_PRECISION_BITS, BATCH_SIZE_STEP, EPSILON, LARGE, MIN_BATCH_SIZE, MIN_SPARSITY,
    PEAK_PRECISION_BITS, SMALL,
};

/// Thresholds and search parameters.
///
/// Each [`PhaseDensity`](crate::PhaseDensity) owns a copy, so instances with
/// different tolerances can coexist.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerances {
    /// Contrast or symmetry at or below this is uninformative.
    pub epsilon: f64,
    /// Magnitudes below this count as zero.
    pub small: f64,
    /// Stand-in for an infinite variance.
    pub large: f64,
    /// Minimum unused fraction for a lookahead subset to stay sparse.
    pub min_sparsity: f64,
    /// First batch size of the batched Fibonacci shot search.
    pub min_batch_size: usize,
    /// Batch size growth between batches.
    pub batch_size_step: usize,
    /// Bits of precision for the feedback angle search.
    pub angle_precision_bits: u32,
    /// Bits of precision for the peak search.
    pub peak_precision_bits: u32,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            epsilon: EPSILON,
            small: SMALL,
            large: LARGE,
            min_sparsity: MIN_SPARSITY,
            min_batch_size: MIN_BATCH_SIZE,
            batch_size_step: BATCH_SIZE_STEP,
            angle_precision_bits: ANGLE_PRECISION_BITS,
            peak_precision_bits: PEAK_PRECISION_BITS,
        }
    }
}

impl Tolerances {
    /// Create tolerances with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tighter angle search, for offline analysis.
    pub fn precise() -> Self {
        Self {
            angle_precision_bits: 12,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the uninformative-measurement threshold.
    pub fn epsilon(mut self, epsilon: f64) -> Self {
        assert!(epsilon >= 0.0 && epsilon < 1.0, "epsilon must be in [0, 1)");
        self.epsilon = epsilon;
        self
    }

    /// Set the minimum lookahead sparsity.
    pub fn min_sparsity(mut self, sparsity: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&sparsity),
            "min_sparsity must be in [0, 1)"
        );
        self.min_sparsity = sparsity;
        self
    }

    /// Set the first batch size of the shot search.
    pub fn min_batch_size(mut self, size: usize) -> Self {
        assert!(size > 0, "min_batch_size must be > 0");
        self.min_batch_size = size;
        self
    }

    /// Set the batch size growth of the shot search.
    pub fn batch_size_step(mut self, step: usize) -> Self {
        self.batch_size_step = step;
        self
    }

    /// Set the angle search precision in bits.
    pub fn angle_precision_bits(mut self, bits: u32) -> Self {
        assert!(
            bits > 0 && bits <= PEAK_PRECISION_BITS,
            "angle_precision_bits must be in [1, 26]"
        );
        self.angle_precision_bits = bits;
        self
    }

    /// Set the peak search precision in bits.
    pub fn peak_precision_bits(mut self, bits: u32) -> Self {
        assert!(
            bits > 0 && bits <= PEAK_PRECISION_BITS,
            "peak_precision_bits must be in [1, 26]"
        );
        self.peak_precision_bits = bits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let tol = Tolerances::default();
        assert_eq!(tol.min_sparsity, 0.15);
        assert_eq!(tol.min_batch_size, 1);
        assert_eq!(tol.batch_size_step, 1);
        assert_eq!(tol.angle_precision_bits, 5);
        assert_eq!(tol.epsilon, 10.0 * f64::EPSILON);
    }

    #[test]
    fn builders_set_values() {
        let tol = Tolerances::new().min_sparsity(0.3).min_batch_size(4).batch_size_step(2);
        assert_eq!(tol.min_sparsity, 0.3);
        assert_eq!(tol.min_batch_size, 4);
        assert_eq!(tol.batch_size_step, 2);
        assert_eq!(Tolerances::precise().angle_precision_bits, 12);
    }

    #[test]
    #[should_panic(expected = "min_sparsity must be in [0, 1)")]
    fn min_sparsity_one_panics() {
        let _ = Tolerances::new().min_sparsity(1.0);
    }

    #[test]
    #[should_panic(expected = "min_batch_size must be > 0")]
    fn min_batch_size_zero_panics() {
        let _ = Tolerances::new().min_batch_size(0);
    }

    #[test]
    #[should_panic(expected = "angle_precision_bits must be in [1, 26]")]
    fn angle_precision_too_fine_panics() {
        let _ = Tolerances::new().angle_precision_bits(40);
    }
}
