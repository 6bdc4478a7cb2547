//! Numeric thresholds and search defaults used throughout the crate.

/// Default deterministic seed for RNG operations.
///
/// The value `0x7068617365` is "phase" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x7068617365;

/// 2 * ln(2), the constant part of the entropy gain.
pub const TWO_LN_2: f64 = 1.3862943611198906;

// =============================================================================
// Tolerance defaults
// =============================================================================

/// Ten times machine epsilon. Contrasts or symmetries at or below this value
/// make a measurement uninformative.
pub const EPSILON: f64 = 10.0 * f64::EPSILON;

/// Square root of the smallest positive normal `f64`.
pub const SMALL: f64 = 1.4916681462400413e-154;

/// Square root of the largest finite `f64`. Used as the "infinite" variance.
pub const LARGE: f64 = 1.3407807929942596e154;

/// Lookahead subsets using more than `1 - MIN_SPARSITY` of the coefficient
/// range fall back to full-density updates.
pub const MIN_SPARSITY: f64 = 0.15;

/// First batch size of the batched Fibonacci shot search.
pub const MIN_BATCH_SIZE: usize = 1;

/// Growth of the batch size between consecutive batches.
pub const BATCH_SIZE_STEP: usize = 1;

/// Bits of precision for the feedback angle search (about two degrees).
pub const ANGLE_PRECISION_BITS: u32 = 5;

/// Bits of precision for the peak (mode) search: half the f64 mantissa.
pub const PEAK_PRECISION_BITS: u32 = 26;

/// Distance from a bracket bound below which the angle search is rerun.
pub const BOUNDARY_GUARD: f64 = 1e-8;

/// Coefficient magnitude below which `spread` zeroes the coefficient.
pub const SPREAD_FLOOR: f64 = 1e-100;

/// Iteration cap for Brent's method.
pub const BRENT_MAX_ITERATIONS: usize = 200;
