//! The adaptive measurement loop.

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tape_core::{GainKind, GainPoint, Outcome, PhaseDensity, ShotSetting};

use crate::config::Config;
use crate::error::EstimatorError;
use crate::helpers::SimulatedPhase;
use crate::result::{EstimationReport, ShotRecord, StopReason};

/// Adaptive phase estimator.
///
/// Holds a [`Config`] and opens [`AdaptiveSession`]s that choose each
/// measurement from the current posterior.
///
/// # Example
///
/// ```
/// use tape::{Config, PhaseEstimator, SimulatedPhase};
///
/// let estimator = PhaseEstimator::with_config(Config::quick());
/// let mut source = SimulatedPhase::new(1.2);
/// let report = estimator
///     .session()
///     .unwrap()
///     .run(|shot| source.measure(shot))
///     .unwrap();
/// assert!(report.measurements <= 60);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PhaseEstimator {
    config: Config,
}

impl PhaseEstimator {
    /// Create an estimator with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an estimator with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Create an estimator with the quick preset.
    pub fn quick() -> Self {
        Self::with_config(Config::quick())
    }

    /// Create an estimator with the thorough preset.
    pub fn thorough() -> Self {
        Self::with_config(Config::thorough())
    }

    /// The estimator's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the objective.
    pub fn gain_kind(mut self, kind: GainKind) -> Self {
        self.config = self.config.gain_kind(kind);
        self
    }

    /// Set the lookahead depth.
    pub fn lookahead(mut self, depth: usize) -> Self {
        self.config = self.config.lookahead(depth);
        self
    }

    /// Set the measurement budget.
    pub fn max_measurements(mut self, n: usize) -> Self {
        self.config = self.config.max_measurements(n);
        self
    }

    /// Set the target variance.
    pub fn target_variance(mut self, variance: f64) -> Self {
        self.config = self.config.target_variance(variance);
        self
    }

    /// Open a session with a uniform prior.
    ///
    /// # Errors
    ///
    /// Fails when a candidate exceeds `max_repetitions`, when
    /// `max_repetitions` exceeds `max_order`, or when a per-k vector does not
    /// have `max_repetitions` entries.
    pub fn session(&self) -> Result<AdaptiveSession, EstimatorError> {
        let config = &self.config;
        if config.candidates.is_empty() {
            return Err(EstimatorError::NoCandidates);
        }
        if let Some(&k) = config
            .candidates
            .iter()
            .find(|&&k| k == 0 || k > config.max_repetitions)
        {
            return Err(EstimatorError::CandidateOutOfRange {
                k,
                k_max: config.max_repetitions,
            });
        }

        let mut density = PhaseDensity::new(config.max_order, config.max_repetitions)?
            .with_tolerances(config.tolerances);
        if let Some(z) = &config.contrasts {
            density.set_contrasts(z)?;
        }
        if let Some(lambda) = &config.symmetries {
            density.set_symmetries(lambda)?;
        }
        if let Some(w) = &config.weights {
            density.set_weights(w)?;
        }

        tracing::debug!(
            gain = ?config.gain_kind,
            candidates = config.candidates.len(),
            lookahead = config.lookahead,
            max_order = config.max_order,
            "opened estimation session"
        );
        Ok(AdaptiveSession {
            density,
            config: config.clone(),
            history: Vec::new(),
            total_repetitions: 0,
        })
    }

    /// Estimate `phase` from simulated measurements.
    ///
    /// The simulation uses the configured seed and measurement model.
    pub fn simulate(&self, phase: f64) -> Result<EstimationReport, EstimatorError> {
        let session = self.session()?;
        let model = session.density().model();
        let mut source = SimulatedPhase::with_seed(phase, self.config.seed)
            .with_model(model.contrasts(), model.symmetries());
        session.run(|shot| source.measure(shot))
    }
}

/// A running estimation: the posterior density and the measurements so far.
#[derive(Debug, Clone)]
pub struct AdaptiveSession {
    density: PhaseDensity,
    config: Config,
    history: Vec<ShotRecord>,
    total_repetitions: usize,
}

impl AdaptiveSession {
    /// The current posterior.
    pub fn density(&self) -> &PhaseDensity {
        &self.density
    }

    /// Measurements recorded so far.
    pub fn history(&self) -> &[ShotRecord] {
        &self.history
    }

    /// Current phase variance.
    pub fn variance(&self) -> f64 {
        self.density.variance()
    }

    /// Whether the variance has reached the target.
    pub fn is_converged(&self) -> bool {
        self.variance() <= self.config.target_variance
    }

    /// Whether the measurement budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.history.len() >= self.config.max_measurements
    }

    /// Choose the next measurement.
    ///
    /// Variance and sharpness gains need a mean direction. Until the first
    /// harmonic is nonzero the smallest candidate is measured at angle 0.
    ///
    /// With a lookahead of 2 or more every candidate k is scored by the
    /// expected gain of `lookahead` measurements with repetition count k,
    /// regardless of `brute_force`. The `parallel` feature scores the
    /// candidates with rayon.
    pub fn next_shot(&self) -> Result<ShotSetting, EstimatorError> {
        let config = &self.config;
        if config.gain_kind != GainKind::Entropy && !self.has_mean()? {
            let k = config
                .candidates
                .iter()
                .copied()
                .min()
                .ok_or(EstimatorError::NoCandidates)?;
            tracing::trace!(k, "no mean direction, measuring at angle 0");
            return Ok(ShotSetting { angle: 0.0, k });
        }

        if config.lookahead <= 1 {
            return Ok(self.density.find_best_shot_setting(
                &config.candidates,
                config.gain_kind,
                config.brute_force,
            )?);
        }

        // Every candidate is scored; the batched search assumes a unimodal
        // single-shot gain.
        let score = |k: usize| -> Result<GainPoint, EstimatorError> {
            let shots = vec![k; config.lookahead];
            let point = self.density.multi_shot_gain(&shots, config.gain_kind)?;
            let point = GainPoint::new(point.angle, point.gain / self.density.model().weight(k));
            tracing::trace!(k, gain = point.gain, "scored lookahead candidate");
            Ok(point)
        };
        #[cfg(feature = "parallel")]
        let scored: Vec<Result<GainPoint, EstimatorError>> =
            config.candidates.par_iter().map(|&k| score(k)).collect();
        #[cfg(not(feature = "parallel"))]
        let scored: Vec<Result<GainPoint, EstimatorError>> =
            config.candidates.iter().map(|&k| score(k)).collect();

        let mut best: Option<(usize, GainPoint)> = None;
        for (&k, point) in config.candidates.iter().zip(scored) {
            let point = point?;
            if best.map_or(true, |(_, b)| point > b) {
                best = Some((k, point));
            }
        }
        let (k, point) = best.ok_or(EstimatorError::NoCandidates)?;
        Ok(ShotSetting {
            angle: point.angle,
            k,
        })
    }

    fn has_mean(&self) -> Result<bool, EstimatorError> {
        if self.density.order() < 1 {
            return Ok(false);
        }
        Ok(self.density.harmonic(1)?.norm_sqr() > self.density.tolerances().small)
    }

    /// Update the posterior with the outcome of `shot`.
    pub fn record(&mut self, shot: ShotSetting, outcome: Outcome) -> Result<(), EstimatorError> {
        self.density.update(outcome, shot.angle, shot.k)?;
        self.total_repetitions += shot.k;
        let record = ShotRecord {
            index: self.history.len(),
            k: shot.k,
            angle: shot.angle,
            outcome,
            variance: self.density.variance(),
        };
        tracing::debug!(
            index = record.index,
            k = record.k,
            angle = record.angle,
            outcome = ?outcome,
            variance = record.variance,
            "recorded measurement"
        );
        self.history.push(record);
        Ok(())
    }

    /// Measure until the target variance is reached or the budget is spent.
    ///
    /// `measure` performs the chosen measurement and returns its outcome.
    pub fn run<F>(mut self, mut measure: F) -> Result<EstimationReport, EstimatorError>
    where
        F: FnMut(ShotSetting) -> Outcome,
    {
        let stop_reason = loop {
            if self.is_converged() {
                break StopReason::TargetVariance;
            }
            if self.is_exhausted() {
                break StopReason::MeasurementBudget;
            }
            let shot = self.next_shot()?;
            let outcome = measure(shot);
            self.record(shot, outcome)?;
        };
        self.finish(stop_reason)
    }

    /// Summarise the session.
    ///
    /// # Errors
    ///
    /// Fails while the posterior is still uniform.
    pub fn finish(self, stop_reason: StopReason) -> Result<EstimationReport, EstimatorError> {
        let report = EstimationReport {
            estimate: self.density.phase_estimate()?,
            peak_estimate: self.density.peak_estimate()?,
            variance: self.density.variance(),
            measurements: self.history.len(),
            total_repetitions: self.total_repetitions,
            stop_reason,
            history: self.history,
        };
        tracing::info!(
            estimate = report.estimate,
            variance = report.variance,
            measurements = report.measurements,
            total_repetitions = report.total_repetitions,
            %stop_reason,
            "estimation finished"
        );
        Ok(report)
    }
}
