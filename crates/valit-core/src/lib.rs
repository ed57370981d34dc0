mod engine;

pub use engine::config::{
    DEFAULT_PROBABILITY_TOLERANCE, Horizon, SolverConfig, SolverConfigError, SweepMode,
};
pub use engine::error::{ContractViolation, ParameterError, SolveError, ValueIterationError};
pub use engine::ids::{ActionIndex, StateIndex};
pub use engine::model::{FnModel, MdpModel, TryMdpModel};
pub use engine::solver::{
    Solution, SolveMetrics, SweepMetrics, try_value_iteration, try_value_iteration_with_hook,
    value_iteration,
};
