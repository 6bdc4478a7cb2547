//! Tests for configuration validation.
//!
//! Invalid values are rejected by the builder methods with a panic message,
//! and inconsistent combinations are rejected when a session is opened.

use tape::{Config, EstimatorError, PhaseEstimator};

// =============================================================================
// CANDIDATES
// =============================================================================

#[test]
#[should_panic(expected = "candidates must not be empty")]
fn empty_candidates_panics() {
    let _ = Config::new().candidates(Vec::<usize>::new());
}

#[test]
#[should_panic(expected = "candidates must be > 0")]
fn zero_candidate_panics() {
    let _ = Config::new().candidates(vec![0, 1]);
}

#[test]
fn candidate_beyond_model_rejected_at_session() {
    let estimator = PhaseEstimator::with_config(Config::new().candidates(vec![1, 32]));
    assert_eq!(
        estimator.session().unwrap_err(),
        EstimatorError::CandidateOutOfRange { k: 32, k_max: 16 }
    );
}

#[test]
fn repetition_count_beyond_capacity_rejected_at_session() {
    let estimator = PhaseEstimator::with_config(
        Config::new()
            .candidates(vec![1])
            .max_repetitions(64)
            .max_order(32),
    );
    assert!(matches!(
        estimator.session(),
        Err(EstimatorError::Density(_))
    ));
}

// =============================================================================
// LOOP PARAMETERS
// =============================================================================

#[test]
#[should_panic(expected = "lookahead must be > 0")]
fn zero_lookahead_panics() {
    let _ = PhaseEstimator::new().lookahead(0);
}

#[test]
#[should_panic(expected = "max_measurements must be > 0")]
fn zero_budget_panics() {
    let _ = PhaseEstimator::new().max_measurements(0);
}

#[test]
#[should_panic(expected = "target_variance must be positive and finite")]
fn zero_target_panics() {
    let _ = PhaseEstimator::new().target_variance(0.0);
}

#[test]
#[should_panic(expected = "target_variance must be positive and finite")]
fn nan_target_panics() {
    let _ = PhaseEstimator::new().target_variance(f64::NAN);
}

#[test]
#[should_panic(expected = "target_variance must be positive and finite")]
fn infinite_target_panics() {
    let _ = PhaseEstimator::new().target_variance(f64::INFINITY);
}

#[test]
fn loop_parameters_stored() {
    let estimator = PhaseEstimator::new()
        .lookahead(3)
        .max_measurements(10)
        .target_variance(1e-3);
    assert_eq!(estimator.config().lookahead, 3);
    assert_eq!(estimator.config().max_measurements, 10);
    assert_eq!(estimator.config().target_variance, 1e-3);
}

// =============================================================================
// MEASUREMENT MODEL
// =============================================================================

#[test]
#[should_panic(expected = "max_order must be > 0")]
fn zero_capacity_panics() {
    let _ = Config::new().max_order(0);
}

#[test]
#[should_panic(expected = "max_repetitions must be > 0")]
fn zero_repetitions_panics() {
    let _ = Config::new().max_repetitions(0);
}

#[test]
#[should_panic(expected = "contrasts must be in [0, 1]")]
fn contrast_above_one_panics() {
    let _ = Config::new().contrasts(vec![1.0, 1.5]);
}

#[test]
#[should_panic(expected = "contrasts must be in [0, 1]")]
fn negative_contrast_panics() {
    let _ = Config::new().contrasts(vec![-0.1]);
}

#[test]
#[should_panic(expected = "symmetries must be in [0, 1]")]
fn nan_symmetry_panics() {
    let _ = Config::new().symmetries(vec![f64::NAN]);
}

#[test]
#[should_panic(expected = "weights must be non-zero")]
fn zero_weight_panics() {
    let _ = Config::new().weights(vec![1.0, 0.0]);
}

#[test]
fn model_length_checked_at_session() {
    let estimator =
        PhaseEstimator::with_config(Config::quick().symmetries(vec![1.0; 4]));
    assert!(matches!(
        estimator.session(),
        Err(EstimatorError::Density(_))
    ));
}

#[test]
fn boundary_model_values_valid() {
    let config = Config::quick()
        .contrasts(vec![0.0, 1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 1.0])
        .symmetries(vec![1.0; 8])
        .weights(vec![-1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    assert!(PhaseEstimator::with_config(config).session().is_ok());
}
