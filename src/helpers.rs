//! Simulated measurements for testing and benchmarking.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use tape_core::constants::DEFAULT_SEED;
use tape_core::{Outcome, ShotSetting};

/// A phase `φ` measured through the two-outcome likelihood
/// `P(0) = (2 - λ_k + λ_k z_k cos(kφ - θ))/2`.
///
/// Outcomes are drawn from a seeded Xoshiro256++ generator, so a session
/// driven by a `SimulatedPhase` is reproducible.
#[derive(Debug, Clone)]
pub struct SimulatedPhase {
    phase: f64,
    contrasts: Vec<f64>,
    symmetries: Vec<f64>,
    rng: Xoshiro256PlusPlus,
}

impl SimulatedPhase {
    /// Ideal measurements of `phase` with the default seed.
    pub fn new(phase: f64) -> Self {
        Self::with_seed(phase, DEFAULT_SEED)
    }

    /// Ideal measurements of `phase` with an explicit seed.
    pub fn with_seed(phase: f64, seed: u64) -> Self {
        Self {
            phase,
            contrasts: Vec::new(),
            symmetries: Vec::new(),
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Use per-k contrasts and symmetries. Missing entries are 1.
    pub fn with_model(mut self, contrasts: &[f64], symmetries: &[f64]) -> Self {
        self.contrasts = contrasts.to_vec();
        self.symmetries = symmetries.to_vec();
        self
    }

    /// The simulated phase.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Probability of outcome 0 for `shot`.
    pub fn probability_zero(&self, shot: ShotSetting) -> f64 {
        let z = per_k(&self.contrasts, shot.k);
        let lambda = per_k(&self.symmetries, shot.k);
        let fringe = (shot.k as f64 * self.phase - shot.angle).cos();
        (2.0 - lambda + lambda * z * fringe) / 2.0
    }

    /// Draw an outcome for `shot`.
    pub fn measure(&mut self, shot: ShotSetting) -> Outcome {
        if self.rng.gen::<f64>() < self.probability_zero(shot) {
            Outcome::Zero
        } else {
            Outcome::One
        }
    }
}

fn per_k(values: &[f64], k: usize) -> f64 {
    k.checked_sub(1)
        .and_then(|i| values.get(i))
        .copied()
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn ideal_fringe() {
        let sim = SimulatedPhase::new(0.5);
        let on = ShotSetting { angle: 1.0, k: 2 };
        let off = ShotSetting {
            angle: 1.0 + PI,
            k: 2,
        };
        assert!((sim.probability_zero(on) - 1.0).abs() < 1e-12);
        assert!(sim.probability_zero(off).abs() < 1e-12);
    }

    #[test]
    fn asymmetric_model() {
        let sim = SimulatedPhase::new(0.0).with_model(&[0.5], &[0.5]);
        let shot = ShotSetting { angle: 0.0, k: 1 };
        // (2 - 0.5 + 0.25)/2
        assert!((sim.probability_zero(shot) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn seeded_draws_repeat() {
        let shot = ShotSetting { angle: 0.3, k: 1 };
        let mut a = SimulatedPhase::with_seed(1.0, 42);
        let mut b = SimulatedPhase::with_seed(1.0, 42);
        let draws_a: Vec<_> = (0..32).map(|_| a.measure(shot)).collect();
        let draws_b: Vec<_> = (0..32).map(|_| b.measure(shot)).collect();
        assert_eq!(draws_a, draws_b);
    }

    #[test]
    fn frequencies_follow_likelihood() {
        let shot = ShotSetting { angle: 0.0, k: 1 };
        let mut sim = SimulatedPhase::new(PI / 3.0);
        let zeros = (0..10_000)
            .filter(|_| sim.measure(shot) == Outcome::Zero)
            .count();
        // P(0) = 0.75
        assert!((zeros as f64 / 10_000.0 - 0.75).abs() < 0.03);
    }
}
