use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::engine::error::{ParameterError, ValueIterationError};

const DEFAULT_SOLVER_CONFIG_YAML: &str = include_str!("../../config/solver.default.yaml");

/// Probability-sum slack used when checking transition vectors.
pub const DEFAULT_PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Number of synchronous backup sweeps to perform.
///
/// Zero is allowed: the value function then stays at zero and the policy is
/// a one-step greedy choice over immediate rewards.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawHorizon", into = "u64")]
pub struct Horizon(u64);

/// Horizon as written in YAML. Integers are taken exactly; floats only when integral.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawHorizon {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl TryFrom<RawHorizon> for Horizon {
    type Error = ValueIterationError;

    fn try_from(raw: RawHorizon) -> Result<Self, Self::Error> {
        match raw {
            RawHorizon::Unsigned(value) => Ok(Horizon(value)),
            RawHorizon::Signed(value) => Horizon::try_from(value),
            RawHorizon::Float(value) => Horizon::try_from(value),
        }
    }
}

impl Horizon {
    /// Get the sweep count.
    pub fn sweeps(&self) -> u64 {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Horizon(1000)
    }
}

impl From<u64> for Horizon {
    fn from(value: u64) -> Self {
        Horizon(value)
    }
}

impl From<Horizon> for u64 {
    fn from(value: Horizon) -> Self {
        value.0
    }
}

impl TryFrom<i64> for Horizon {
    type Error = ValueIterationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map(Horizon)
            .map_err(|_| ParameterError::Horizon { value: value as f64 }.into())
    }
}

impl TryFrom<f64> for Horizon {
    type Error = ValueIterationError;

    /// Accept integral, non-negative floats such as `10.0`; reject `2.5`, `-1.0` and NaN.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value >= u64::MAX as f64 {
            return Err(ParameterError::Horizon { value }.into());
        }
        Ok(Horizon(value as u64))
    }
}

/// How states are distributed within one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepMode {
    /// Evaluate states one after another in enumeration order.
    #[default]
    Sequential,
    /// Evaluate states on the rayon thread pool. Results are identical to
    /// `Sequential`.
    Parallel,
}

/// Solver configuration for value iteration runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub horizon: Horizon,
    pub discount: f64,
    pub sweep_mode: SweepMode,
    pub probability_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            horizon: Horizon::default(),
            discount: 1.0,
            sweep_mode: SweepMode::Sequential,
            probability_tolerance: DEFAULT_PROBABILITY_TOLERANCE,
        }
    }
}

impl SolverConfig {
    /// Sequential config with the given horizon and discount.
    pub fn new(horizon: u64, discount: f64) -> Self {
        SolverConfig {
            horizon: Horizon::from(horizon),
            discount,
            ..SolverConfig::default()
        }
    }

    pub fn with_sweep_mode(mut self, sweep_mode: SweepMode) -> Self {
        self.sweep_mode = sweep_mode;
        self
    }

    /// Parse a solver config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SolverConfigError> {
        let config: SolverConfig = serde_yaml::from_str(yaml).map_err(SolverConfigError::Yaml)?;
        config.validate().map_err(SolverConfigError::Invalid)?;
        Ok(config)
    }

    /// Parse a solver config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SolverConfigError> {
        let yaml = fs::read_to_string(path).map_err(SolverConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SOLVER_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SolverConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    /// Check the scalar parameters. The horizon is valid by construction.
    pub fn validate(&self) -> Result<(), ValueIterationError> {
        // Written so that NaN fails too.
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(ParameterError::Discount {
                value: self.discount,
            }
            .into());
        }
        if !self.probability_tolerance.is_finite() || self.probability_tolerance <= 0.0 {
            return Err(ParameterError::ProbabilityTolerance {
                value: self.probability_tolerance,
            }
            .into());
        }
        Ok(())
    }
}

/// Error type for loading and validating `SolverConfig`.
#[derive(Debug)]
pub enum SolverConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(ValueIterationError),
}

impl fmt::Display for SolverConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolverConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SolverConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SolverConfigError::Invalid(err) => write!(f, "invalid solver config: {err}"),
        }
    }
}

impl std::error::Error for SolverConfigError {}
