//! End-to-end estimation on simulated measurements.

use std::f64::consts::TAU;

use proptest::prelude::*;
use tape::output::{format_report, to_json};
use tape::{
    Config, EstimationReport, GainKind, Outcome, PhaseEstimator, ShotSetting, SimulatedPhase,
    StopReason,
};

fn circular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}

fn assert_consistent(report: &EstimationReport, budget: usize) {
    assert!(report.measurements <= budget);
    assert_eq!(report.history.len(), report.measurements);
    assert_eq!(
        report.total_repetitions,
        report.history.iter().map(|shot| shot.k).sum::<usize>()
    );
    assert!((0.0..TAU).contains(&report.estimate));
    assert!((0.0..TAU).contains(&report.peak_estimate));
    for (i, shot) in report.history.iter().enumerate() {
        assert_eq!(shot.index, i);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn entropy_gain_locates_phase() {
    init_tracing();
    let phase = 1.234;
    let report = PhaseEstimator::quick().simulate(phase).unwrap();
    assert_consistent(&report, 60);
    assert!(report.variance < 1e-2, "variance {}", report.variance);
    assert!(
        circular_distance(report.estimate, phase) < 0.1,
        "estimate {}",
        report.estimate
    );
}

#[test]
fn variance_gain_locates_phase() {
    let phase = 5.0;
    let report = PhaseEstimator::quick()
        .gain_kind(GainKind::Variance)
        .simulate(phase)
        .unwrap();
    assert_consistent(&report, 60);
    assert_eq!(report.history[0].k, 1);
    assert!(circular_distance(report.estimate, phase) < 0.1);
}

#[test]
fn sharpness_gain_locates_phase() {
    let phase = 3.0;
    let report = PhaseEstimator::quick()
        .gain_kind(GainKind::Sharpness)
        .simulate(phase)
        .unwrap();
    assert_consistent(&report, 60);
    assert!(circular_distance(report.estimate, phase) < 0.1);
}

#[test]
fn noisy_measurements_locate_phase() {
    let phase = 0.4;
    let config = Config::quick()
        .contrasts(vec![0.9; 8])
        .symmetries(vec![0.95; 8])
        .max_measurements(120);
    let report = PhaseEstimator::with_config(config)
        .simulate(phase)
        .unwrap();
    assert_consistent(&report, 120);
    assert!(circular_distance(report.estimate, phase) < 0.15);
}

#[test]
fn loose_target_stops_early() {
    let report = PhaseEstimator::quick()
        .target_variance(0.5)
        .simulate(2.0)
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::TargetVariance);
    assert!(report.converged());
    assert!(report.variance <= 0.5);
    assert!(report.measurements < 60);
}

#[test]
fn budget_stops_loop() {
    let report = PhaseEstimator::quick()
        .max_measurements(3)
        .simulate(2.0)
        .unwrap();
    assert_eq!(report.stop_reason, StopReason::MeasurementBudget);
    assert_eq!(report.measurements, 3);
}

#[test]
fn simulation_is_reproducible() {
    let estimator = PhaseEstimator::quick().max_measurements(20);
    let a = estimator.simulate(4.4).unwrap();
    let b = estimator.simulate(4.4).unwrap();
    assert_eq!(a, b);
}

#[test]
fn lookahead_session_runs() {
    let estimator = PhaseEstimator::quick().lookahead(2).max_measurements(12);
    let report = estimator.simulate(1.0).unwrap();
    assert_consistent(&report, 12);
}

#[test]
fn weighted_candidates_prefer_cheap_shots() {
    // Repetitions beyond 1 cost a thousand times more.
    let mut weights = vec![1000.0; 8];
    weights[0] = 1.0;
    let config = Config::quick().weights(weights).max_measurements(10);
    let report = PhaseEstimator::with_config(config).simulate(1.0).unwrap();
    assert!(report.history.iter().all(|shot| shot.k == 1));
}

#[test]
fn manual_session_matches_run() {
    let estimator = PhaseEstimator::quick().max_measurements(15);
    let mut source = SimulatedPhase::with_seed(2.5, 11);
    let run = estimator
        .session()
        .unwrap()
        .run(|shot| source.measure(shot))
        .unwrap();

    let mut source = SimulatedPhase::with_seed(2.5, 11);
    let mut session = estimator.session().unwrap();
    while !session.is_converged() && !session.is_exhausted() {
        let shot = session.next_shot().unwrap();
        session.record(shot, source.measure(shot)).unwrap();
    }
    let manual = session.finish(run.stop_reason).unwrap();
    assert_eq!(manual, run);
}

#[test]
fn recorded_outcomes_drive_posterior() {
    let mut session = PhaseEstimator::quick().session().unwrap();
    // Outcome 0 at angle 0 favours φ near 0.
    for _ in 0..5 {
        session
            .record(ShotSetting { angle: 0.0, k: 1 }, Outcome::Zero)
            .unwrap();
    }
    let report = session.finish(StopReason::MeasurementBudget).unwrap();
    assert!(circular_distance(report.estimate, 0.0) < 1e-9);
    assert!(report.variance < 1.0);
}

#[test]
fn report_outputs() {
    let report = PhaseEstimator::quick()
        .max_measurements(8)
        .simulate(0.9)
        .unwrap();
    let json = to_json(&report).unwrap();
    assert!(json.contains("\"measurements\":8"));
    assert!(json.contains("\"history\""));
    let text = format_report(&report);
    assert!(text.contains("BUDGET SPENT"));
    assert!(text.contains("Measurements: 8"));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn short_sessions_stay_consistent(phase in 0.0..TAU, seed in any::<u64>()) {
        let estimator = PhaseEstimator::with_config(
            Config::quick().max_measurements(6).seed(seed),
        );
        let report = estimator.simulate(phase).unwrap();
        assert_consistent(&report, 6);
        prop_assert!(report.variance.is_finite());
        prop_assert!(report
            .history
            .windows(2)
            .all(|w| w[1].index == w[0].index + 1));
    }
}
