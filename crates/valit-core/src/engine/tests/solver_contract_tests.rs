use std::fmt;

use super::support::{CountingModel, TableModel};
use crate::{
    ContractViolation, FnModel, Horizon, ParameterError, SolveError, SolverConfig, SweepMode,
    TryMdpModel, ValueIterationError, try_value_iteration, value_iteration,
};

fn two_state_model() -> TableModel {
    TableModel {
        probs: vec![vec![vec![0.5, 0.5]; 2]; 2],
        rewards: vec![vec![1.0, 0.0]; 2],
    }
}

#[test]
fn out_of_range_discount_fails_before_any_model_call() {
    let model = two_state_model();

    for discount in [1.5, -0.1, f64::NAN] {
        let counting = CountingModel::new(model.clone());
        let config = SolverConfig::new(10, discount);

        let err = value_iteration(&model.states(), &model.actions(), &counting, &config)
            .expect_err("discount outside [0,1] should fail");

        assert!(matches!(
            err,
            ValueIterationError::InvalidParameter(ParameterError::Discount { .. })
        ));
        assert_eq!(counting.transition_calls(), 0);
        assert_eq!(counting.reward_calls(), 0);
    }
}

#[test]
fn boundary_discounts_are_accepted() {
    let model = two_state_model();

    for discount in [0.0, 1.0] {
        let config = SolverConfig::new(3, discount);
        let result = value_iteration(&model.states(), &model.actions(), &model, &config);
        assert!(result.is_ok());
    }
}

#[test]
fn negative_or_fractional_horizon_is_rejected() {
    for err in [
        Horizon::try_from(-1_i64).expect_err("negative horizon"),
        Horizon::try_from(2.5_f64).expect_err("fractional horizon"),
        Horizon::try_from(-3.0_f64).expect_err("negative float horizon"),
        Horizon::try_from(f64::NAN).expect_err("nan horizon"),
    ] {
        assert!(matches!(
            err,
            ValueIterationError::InvalidParameter(ParameterError::Horizon { .. })
        ));
    }

    assert_eq!(Horizon::try_from(12_i64).map(|h| h.sweeps()), Ok(12));
    assert_eq!(Horizon::try_from(4.0_f64).map(|h| h.sweeps()), Ok(4));
}

#[test]
fn empty_enumerations_are_rejected() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![1.0], |_: &u8, _: &u8| 0.0);
    let config = SolverConfig::default();

    let no_states = value_iteration(&[] as &[u8], &[0u8], &model, &config)
        .expect_err("empty state set should fail");
    let no_actions = value_iteration(&[0u8], &[] as &[u8], &model, &config)
        .expect_err("empty action set should fail");

    assert_eq!(
        no_states,
        ValueIterationError::InvalidParameter(ParameterError::EmptyStates)
    );
    assert_eq!(
        no_actions,
        ValueIterationError::InvalidParameter(ParameterError::EmptyActions)
    );
}

#[test]
fn duplicate_identifiers_are_rejected() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![0.5, 0.5], |_: &u8, _: &u8| 0.0);
    let config = SolverConfig::new(1, 1.0);

    let states_err = value_iteration(&[3u8, 3u8], &[0u8], &model, &config)
        .expect_err("duplicate states should fail");
    let actions_err = value_iteration(&[1u8, 2u8], &[0u8, 1u8, 0u8], &model, &config)
        .expect_err("duplicate actions should fail");

    assert!(matches!(
        states_err,
        ValueIterationError::InvalidParameter(ParameterError::DuplicateState { state })
            if state.index() == 1
    ));
    assert!(matches!(
        actions_err,
        ValueIterationError::InvalidParameter(ParameterError::DuplicateAction { action })
            if action.index() == 2
    ));
}

#[test]
fn half_mass_transition_is_a_contract_violation() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![0.25, 0.25], |_: &u8, _: &u8| 1.0);
    let config = SolverConfig::new(5, 0.9);

    let err = value_iteration(&[0u8, 1u8], &[0u8], &model, &config)
        .expect_err("unnormalized transition should fail");

    assert!(matches!(
        err,
        ValueIterationError::ModelContractViolation(ContractViolation::ProbabilitySum { sum, .. })
            if sum == 0.5
    ));
}

#[test]
fn tiny_rounding_error_is_tolerated() {
    let model = FnModel::new(
        |_: &u8, _: &u8| vec![0.1 + 0.2, 0.7 - 1e-9],
        |_: &u8, _: &u8| 1.0,
    );
    let config = SolverConfig::new(5, 0.9);

    assert!(value_iteration(&[0u8, 1u8], &[0u8], &model, &config).is_ok());
}

#[test]
fn wrong_length_transition_is_a_contract_violation() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![1.0], |_: &u8, _: &u8| 1.0);
    let config = SolverConfig::new(1, 0.9);

    let err = value_iteration(&[0u8, 1u8, 2u8], &[0u8], &model, &config)
        .expect_err("short transition vector should fail");

    assert_eq!(
        err,
        ValueIterationError::ModelContractViolation(ContractViolation::TransitionLength {
            state: 0.into(),
            action: 0.into(),
            expected: 3,
            got: 1,
        })
    );
}

#[test]
fn negative_and_non_finite_probabilities_are_rejected() {
    let config = SolverConfig::new(1, 0.9);

    for row in [vec![1.5, -0.5], vec![f64::NAN, 1.0], vec![f64::INFINITY, 0.0]] {
        let model = FnModel::new(move |_: &u8, _: &u8| row.clone(), |_: &u8, _: &u8| 1.0);
        let err = value_iteration(&[0u8, 1u8], &[0u8], &model, &config)
            .expect_err("invalid probability should fail");

        assert!(matches!(
            err,
            ValueIterationError::ModelContractViolation(ContractViolation::InvalidProbability {
                ..
            })
        ));
    }
}

#[test]
fn non_finite_reward_is_rejected() {
    let model = FnModel::new(
        |_: &u8, _: &u8| vec![1.0],
        |_: &u8, action: &u8| if *action == 1 { f64::NAN } else { 0.0 },
    );
    let config = SolverConfig::new(3, 0.9);

    let err = value_iteration(&[0u8], &[0u8, 1u8], &model, &config)
        .expect_err("NaN reward should fail");

    assert!(matches!(
        err,
        ValueIterationError::ModelContractViolation(ContractViolation::NonFiniteReward {
            action,
            ..
        }) if action.index() == 1
    ));
}

#[test]
fn overflowing_values_fail_instead_of_turning_nan() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![0.0, 1.0], |_: &u8, _: &u8| 1e308);
    let config = SolverConfig::new(5, 1.0);

    let err = value_iteration(&[0u8, 1u8], &[0u8], &model, &config)
        .expect_err("second sweep overflows to infinity");

    assert!(matches!(
        err,
        ValueIterationError::ModelContractViolation(ContractViolation::ValueOverflow {
            state,
            value,
            ..
        }) if state.index() == 0 && value.is_infinite()
    ));
}

#[test]
fn violation_in_zero_horizon_policy_extraction_is_reported() {
    let model = FnModel::new(|_: &u8, _: &u8| vec![0.9], |_: &u8, _: &u8| 1.0);
    let config = SolverConfig::new(0, 1.0);

    let err = value_iteration(&[0u8], &[0u8], &model, &config)
        .expect_err("bad row should fail during extraction");

    assert!(matches!(
        err,
        ValueIterationError::ModelContractViolation(ContractViolation::ProbabilitySum { .. })
    ));
}

#[test]
fn parallel_mode_reports_earliest_failing_state() {
    // States 2 and 4 both break the contract; state 2 comes first.
    let model = FnModel::new(
        |state: &usize, _: &u8| {
            let mut row = vec![0.0; 6];
            row[*state] = if *state == 2 || *state == 4 { 0.5 } else { 1.0 };
            row
        },
        |_: &usize, _: &u8| 0.0,
    );
    let states: Vec<usize> = (0..6).collect();

    for mode in [SweepMode::Sequential, SweepMode::Parallel] {
        let config = SolverConfig::new(3, 0.9).with_sweep_mode(mode);
        let err = value_iteration(&states, &[0u8], &model, &config)
            .expect_err("bad rows should fail");

        assert!(matches!(
            err,
            ValueIterationError::ModelContractViolation(ContractViolation::ProbabilitySum {
                state,
                ..
            }) if state.index() == 2
        ));
    }
}

#[derive(Debug, PartialEq)]
struct LookupFailed(u8);

impl fmt::Display for LookupFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no entry for state {}", self.0)
    }
}

/// Model that cannot answer for one state.
struct PartialModel;

impl TryMdpModel<u8, u8> for PartialModel {
    type Error = LookupFailed;

    fn try_transition(&self, state: &u8, _action: &u8) -> Result<Vec<f64>, Self::Error> {
        if *state == 1 {
            return Err(LookupFailed(*state));
        }
        Ok(vec![1.0, 0.0])
    }

    fn try_reward(&self, _state: &u8, _action: &u8) -> Result<f64, Self::Error> {
        Ok(1.0)
    }
}

#[test]
fn fallible_model_errors_surface_unchanged() {
    let config = SolverConfig::new(2, 1.0);

    let err = try_value_iteration(&[0u8, 1u8], &[0u8], &PartialModel, &config)
        .expect_err("model failure should abort the run");

    assert!(matches!(err, SolveError::Model(LookupFailed(1))));
    assert_eq!(err.to_string(), "model callback failed: no entry for state 1");
}

#[test]
fn fallible_model_still_gets_parameter_validation() {
    let config = SolverConfig::new(2, 2.0);

    let err = try_value_iteration(&[0u8, 1u8], &[0u8], &PartialModel, &config)
        .expect_err("bad discount should fail first");

    assert!(matches!(
        err,
        SolveError::Solver(ValueIterationError::InvalidParameter(
            ParameterError::Discount { .. }
        ))
    ));
}
