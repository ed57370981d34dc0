use thiserror::Error;
use valit_core::ValueIterationError;

#[derive(Debug, Error)]
/// Error type for MDP loading, validation, compilation, builder and solve operations.
pub enum MdpError {
    #[error("failed to read YAML file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("model must declare at least one state")]
    NoStates,

    #[error("model must declare at least one action")]
    NoActions,

    #[error("duplicate state id '{id}'")]
    DuplicateStateId { id: String },

    #[error("duplicate action id '{id}'")]
    DuplicateActionId { id: String },

    #[error("action '{action}' is defined twice in state '{state}'")]
    DuplicateStateAction { state: String, action: String },

    #[error("state '{state}' defines undeclared action '{action}'")]
    UndeclaredAction { state: String, action: String },

    #[error("state '{state}' does not define action '{action}'")]
    MissingAction { state: String, action: String },

    #[error("state '{state}' is terminal and cannot declare actions")]
    TerminalStateHasActions { state: String },

    #[error("outcome in state '{state}', action '{action}' references unknown next state '{next}'")]
    UnknownNextState {
        state: String,
        action: String,
        next: String,
    },

    #[error(
        "invalid probability in state '{state}', action '{action}', outcome {outcome_index}: {value}"
    )]
    InvalidProbability {
        state: String,
        action: String,
        outcome_index: usize,
        value: f64,
    },

    #[error(
        "invalid reward in state '{state}', action '{action}', outcome {outcome_index}: {value}"
    )]
    InvalidReward {
        state: String,
        action: String,
        outcome_index: usize,
        value: f64,
    },

    #[error(
        "probability sum for state '{state}', action '{action}' must be within {tolerance} of 1.0, got {sum}"
    )]
    ProbabilitySum {
        state: String,
        action: String,
        sum: f64,
        tolerance: f64,
    },

    #[error("state '{state}' action '{action}' must contain at least one outcome")]
    EmptyOutcomes { state: String, action: String },

    #[error("builder referenced unknown state '{state}'")]
    BuilderUnknownState { state: String },

    #[error("builder referenced unknown action '{action}'")]
    BuilderUnknownAction { action: String },

    #[error(transparent)]
    Solve(#[from] ValueIterationError),
}
