//! Configuration for adaptive phase estimation.

use tape_core::constants::DEFAULT_SEED;
use tape_core::{GainKind, Tolerances};

/// Configuration options for [`PhaseEstimator`](crate::PhaseEstimator).
///
/// Controls which objective ranks measurements, which repetition counts are
/// considered, the measurement model, and when the loop stops.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Measurement selection
    // =========================================================================
    /// Objective maximised when choosing the next measurement.
    ///
    /// Default: [`GainKind::Entropy`].
    pub gain_kind: GainKind,

    /// Repetition counts considered for each measurement.
    ///
    /// Every candidate must be in `1..=max_repetitions`. Default: 1 to 16.
    pub candidates: Vec<usize>,

    /// Number of measurements planned ahead when scoring a candidate.
    ///
    /// 1 scores each candidate by its own expected gain. Larger values score
    /// candidate k by the expected gain of `lookahead` measurements with
    /// repetition count k. Default: 1.
    pub lookahead: usize,

    /// Score every candidate instead of the batched Fibonacci search.
    ///
    /// Only affects single-measurement selection; a lookahead of 2 or more
    /// always scores every candidate. Default: false.
    pub brute_force: bool,

    // =========================================================================
    // Stopping
    // =========================================================================
    /// Maximum number of measurements. Default: 200.
    pub max_measurements: usize,

    /// Stop once the phase variance falls to this value. Default: 1e-6.
    pub target_variance: f64,

    // =========================================================================
    // Density and measurement model
    // =========================================================================
    /// Coefficient capacity of the phase density. Default: 4096.
    pub max_order: usize,

    /// Largest repetition count K of the measurement model. Default: 16.
    pub max_repetitions: usize,

    /// Per-k contrasts, length K. Default: None (all ones).
    pub contrasts: Option<Vec<f64>>,

    /// Per-k symmetries, length K. Default: None (all ones).
    pub symmetries: Option<Vec<f64>>,

    /// Per-k weights dividing each candidate's gain, length K.
    ///
    /// Weighting by k ranks candidates by gain per repetition. Default: None
    /// (all ones).
    pub weights: Option<Vec<f64>>,

    /// Numeric tolerances and search parameters of the engine.
    pub tolerances: Tolerances,

    /// Seed for simulated measurements. Default: [`DEFAULT_SEED`].
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gain_kind: GainKind::Entropy,
            candidates: (1..=16).collect(),
            lookahead: 1,
            brute_force: false,

            max_measurements: 200,
            target_variance: 1e-6,

            max_order: 4096,
            max_repetitions: 16,
            contrasts: None,
            symmetries: None,
            weights: None,
            tolerances: Tolerances::default(),
            seed: DEFAULT_SEED,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a quick configuration for development.
    ///
    /// - repetition counts 1 to 8
    /// - 60 measurements
    /// - target variance 1e-4
    pub fn quick() -> Self {
        Self {
            candidates: (1..=8).collect(),
            max_repetitions: 8,
            max_measurements: 60,
            target_variance: 1e-4,
            max_order: 1024,
            ..Default::default()
        }
    }

    /// Create a thorough configuration.
    ///
    /// - two-measurement lookahead
    /// - every candidate scored
    /// - 1,000 measurements, target variance 1e-8
    /// - finer angle search
    pub fn thorough() -> Self {
        Self {
            lookahead: 2,
            brute_force: true,
            max_measurements: 1_000,
            target_variance: 1e-8,
            max_order: 16_384,
            tolerances: Tolerances::precise(),
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set the objective.
    pub fn gain_kind(mut self, kind: GainKind) -> Self {
        self.gain_kind = kind;
        self
    }

    /// Set the candidate repetition counts.
    pub fn candidates(mut self, ks: impl Into<Vec<usize>>) -> Self {
        let ks = ks.into();
        assert!(!ks.is_empty(), "candidates must not be empty");
        assert!(ks.iter().all(|&k| k > 0), "candidates must be > 0");
        self.candidates = ks;
        self
    }

    /// Set the lookahead depth.
    pub fn lookahead(mut self, depth: usize) -> Self {
        assert!(depth > 0, "lookahead must be > 0");
        self.lookahead = depth;
        self
    }

    /// Score every candidate.
    pub fn brute_force(mut self, enabled: bool) -> Self {
        self.brute_force = enabled;
        self
    }

    /// Set the measurement budget.
    pub fn max_measurements(mut self, n: usize) -> Self {
        assert!(n > 0, "max_measurements must be > 0");
        self.max_measurements = n;
        self
    }

    /// Set the target variance.
    pub fn target_variance(mut self, variance: f64) -> Self {
        assert!(
            variance > 0.0 && variance.is_finite(),
            "target_variance must be positive and finite"
        );
        self.target_variance = variance;
        self
    }

    /// Set the density's coefficient capacity.
    pub fn max_order(mut self, n: usize) -> Self {
        assert!(n > 0, "max_order must be > 0");
        self.max_order = n;
        self
    }

    /// Set the largest repetition count of the measurement model.
    pub fn max_repetitions(mut self, k: usize) -> Self {
        assert!(k > 0, "max_repetitions must be > 0");
        self.max_repetitions = k;
        self
    }

    /// Set per-k contrasts.
    pub fn contrasts(mut self, z: impl Into<Vec<f64>>) -> Self {
        let z = z.into();
        assert!(
            z.iter().all(|z| (0.0..=1.0).contains(z)),
            "contrasts must be in [0, 1]"
        );
        self.contrasts = Some(z);
        self
    }

    /// Set per-k symmetries.
    pub fn symmetries(mut self, lambda: impl Into<Vec<f64>>) -> Self {
        let lambda = lambda.into();
        assert!(
            lambda.iter().all(|l| (0.0..=1.0).contains(l)),
            "symmetries must be in [0, 1]"
        );
        self.symmetries = Some(lambda);
        self
    }

    /// Set per-k weights.
    pub fn weights(mut self, w: impl Into<Vec<f64>>) -> Self {
        let w = w.into();
        assert!(
            w.iter().all(|&w| w != 0.0 && !w.is_nan()),
            "weights must be non-zero"
        );
        self.weights = Some(w);
        self
    }

    /// Set the engine tolerances.
    pub fn tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    /// Set the simulation seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_are_consistent() {
        for config in [Config::new(), Config::quick(), Config::thorough()] {
            assert!(config
                .candidates
                .iter()
                .all(|&k| k <= config.max_repetitions));
            assert!(config.max_repetitions <= config.max_order);
        }
        assert_eq!(Config::thorough().lookahead, 2);
    }

    #[test]
    fn builders_chain() {
        let config = Config::new()
            .gain_kind(GainKind::Sharpness)
            .candidates(vec![1, 2, 4])
            .max_repetitions(4)
            .weights([1.0, 2.0, 3.0, 4.0])
            .seed(7);
        assert_eq!(config.gain_kind, GainKind::Sharpness);
        assert_eq!(config.candidates, vec![1, 2, 4]);
        assert_eq!(config.weights.as_deref(), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(config.seed, 7);
    }
}
