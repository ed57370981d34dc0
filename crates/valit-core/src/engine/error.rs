use thiserror::Error;

use crate::engine::ids::{ActionIndex, StateIndex};

/// Error type for value iteration runs.
///
/// Both kinds are fatal to the run that produced them: no partial value
/// function or policy is ever returned alongside an error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueIterationError {
    /// Malformed or out-of-range arguments, detected before any model call.
    #[error("invalid parameter: {0}")]
    InvalidParameter(#[from] ParameterError),

    /// The transition or reward model returned data outside its contract.
    #[error("model contract violation: {0}")]
    ModelContractViolation(#[from] ContractViolation),
}

/// Rejected solver arguments.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("discount must be in [0,1], got {value}")]
    Discount { value: f64 },

    #[error("horizon must be a non-negative integer, got {value}")]
    Horizon { value: f64 },

    #[error("state set must be non-empty")]
    EmptyStates,

    #[error("action set must be non-empty")]
    EmptyActions,

    #[error("state at position {} duplicates an earlier state", .state.index())]
    DuplicateState { state: StateIndex },

    #[error("action at position {} duplicates an earlier action", .action.index())]
    DuplicateAction { action: ActionIndex },

    #[error("probability tolerance must be finite and > 0, got {value}")]
    ProbabilityTolerance { value: f64 },
}

/// Model output that breaks the transition/reward contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContractViolation {
    #[error(
        "transition vector for state {}, action {} has {got} entries, expected {expected}",
        .state.index(),
        .action.index()
    )]
    TransitionLength {
        state: StateIndex,
        action: ActionIndex,
        expected: usize,
        got: usize,
    },

    #[error(
        "transition probability for state {}, action {}, successor {} is invalid: {value}",
        .state.index(),
        .action.index(),
        .successor.index()
    )]
    InvalidProbability {
        state: StateIndex,
        action: ActionIndex,
        successor: StateIndex,
        value: f64,
    },

    #[error(
        "transition probabilities for state {}, action {} must sum to 1.0 within {tolerance}, got {sum}",
        .state.index(),
        .action.index()
    )]
    ProbabilitySum {
        state: StateIndex,
        action: ActionIndex,
        sum: f64,
        tolerance: f64,
    },

    #[error(
        "reward for state {}, action {} is not finite: {value}",
        .state.index(),
        .action.index()
    )]
    NonFiniteReward {
        state: StateIndex,
        action: ActionIndex,
        value: f64,
    },

    #[error(
        "backed-up value for state {}, action {} overflowed: {value}",
        .state.index(),
        .action.index()
    )]
    ValueOverflow {
        state: StateIndex,
        action: ActionIndex,
        value: f64,
    },
}

/// Error type for runs over fallible models.
///
/// `Model` carries the model's own failure untouched, so callback errors
/// (for example from an embedding language) reach the caller as raised.
#[derive(Debug)]
pub enum SolveError<E> {
    Solver(ValueIterationError),
    Model(E),
}

impl<E> From<ValueIterationError> for SolveError<E> {
    fn from(value: ValueIterationError) -> Self {
        SolveError::Solver(value)
    }
}

impl<E> From<ParameterError> for SolveError<E> {
    fn from(value: ParameterError) -> Self {
        SolveError::Solver(value.into())
    }
}

impl<E> From<ContractViolation> for SolveError<E> {
    fn from(value: ContractViolation) -> Self {
        SolveError::Solver(value.into())
    }
}

impl<E: std::fmt::Display> std::fmt::Display for SolveError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::Solver(err) => write!(f, "{err}"),
            SolveError::Model(err) => write!(f, "model callback failed: {err}"),
        }
    }
}

impl<E: std::fmt::Debug + std::fmt::Display> std::error::Error for SolveError<E> {}
