#![allow(unsafe_op_in_unsafe_fn)]

use ::valit_core::{
    Horizon, SolveError, SolverConfig, TryMdpModel, ValueIterationError, try_value_iteration,
};
use ::valit_mdp::{MdpError, MdpSpec, TabularMdp, compile_yaml};
use pyo3::create_exception;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyInt};

create_exception!(
    valit,
    InvalidParameterError,
    PyValueError,
    "Raised for out-of-range discount, malformed horizon, or empty/duplicate states and actions."
);
create_exception!(
    valit,
    ModelContractViolationError,
    PyValueError,
    "Raised when `probs` or `rewards` return data outside their contract."
);

fn solver_err_to_py(err: ValueIterationError) -> PyErr {
    match err {
        ValueIterationError::InvalidParameter(_) => InvalidParameterError::new_err(err.to_string()),
        ValueIterationError::ModelContractViolation(_) => {
            ModelContractViolationError::new_err(err.to_string())
        }
    }
}

fn mdp_err_to_py(err: MdpError) -> PyErr {
    match err {
        MdpError::Solve(err) => solver_err_to_py(err),
        other => PyValueError::new_err(other.to_string()),
    }
}

/// Accept `int` or an integral `float` horizon; reject `bool`, negatives and fractions.
fn parse_horizon(value: &Bound<'_, PyAny>) -> PyResult<Horizon> {
    let horizon = if value.is_instance_of::<PyInt>() && !value.is_instance_of::<PyBool>() {
        let raw: i64 = value.extract().map_err(|_| {
            InvalidParameterError::new_err("horizon must be a non-negative integer")
        })?;
        Horizon::try_from(raw)
    } else if value.is_instance_of::<PyFloat>() {
        Horizon::try_from(value.extract::<f64>()?)
    } else {
        return Err(InvalidParameterError::new_err(
            "horizon must be a non-negative integer",
        ));
    };
    horizon.map_err(solver_err_to_py)
}

/// Python callables over positions into the caller's state and action lists.
///
/// Callbacks are invoked with keyword arguments `state=` and `action=`.
struct PyCallbackModel {
    states: Vec<Py<PyAny>>,
    actions: Vec<Py<PyAny>>,
    probs: Py<PyAny>,
    rewards: Py<PyAny>,
}

impl PyCallbackModel {
    fn call<'py>(
        &self,
        py: Python<'py>,
        callback: &Py<PyAny>,
        state: usize,
        action: usize,
    ) -> PyResult<Bound<'py, PyAny>> {
        let kwargs = PyDict::new_bound(py);
        kwargs.set_item("state", self.states[state].bind(py))?;
        kwargs.set_item("action", self.actions[action].bind(py))?;
        callback.bind(py).call((), Some(&kwargs))
    }
}

impl TryMdpModel<usize, usize> for PyCallbackModel {
    type Error = PyErr;

    fn try_transition(&self, state: &usize, action: &usize) -> Result<Vec<f64>, Self::Error> {
        Python::with_gil(|py| {
            let row = self.call(py, &self.probs, *state, *action)?;
            // Lists, tuples and numpy arrays all iterate as floats.
            row.iter()?.map(|item| item?.extract::<f64>()).collect()
        })
    }

    fn try_reward(&self, state: &usize, action: &usize) -> Result<f64, Self::Error> {
        Python::with_gil(|py| self.call(py, &self.rewards, *state, *action)?.extract())
    }
}

/// Reject repeated identifiers with the same message the core uses.
fn ensure_distinct(py: Python<'_>, items: &[Py<PyAny>], kind: &str) -> PyResult<()> {
    let seen = PyDict::new_bound(py);
    for (idx, item) in items.iter().enumerate() {
        let item = item.bind(py);
        if seen.contains(item)? {
            return Err(InvalidParameterError::new_err(format!(
                "{kind} at position {idx} duplicates an earlier {kind}"
            )));
        }
        seen.set_item(item, idx)?;
    }
    Ok(())
}

#[pyfunction]
#[pyo3(signature = (states, actions, probs, rewards, horizon=None, discount=1.0))]
#[pyo3(text_signature = "(states, actions, probs, rewards, horizon=1000, discount=1, /)")]
/// value_iteration(states, actions, probs, rewards, horizon=1000, discount=1, /)
/// --
///
/// Compute the optimal policy and value function of a finite MDP.
///
/// `probs(state=s, action=a)` must return one probability per entry of
/// `states`, in the same order, summing to 1. `rewards(state=s, action=a)`
/// must return the immediate reward. Exactly `horizon` synchronous sweeps
/// are run from an all-zero value function.
///
/// Returns:
///     tuple[dict, dict]: `(policy, values)` keyed by state.
///
/// Raises:
///     InvalidParameterError: For a bad discount, horizon, or state/action list.
///     ModelContractViolationError: For malformed `probs`/`rewards` output.
fn value_iteration<'py>(
    py: Python<'py>,
    states: Vec<Py<PyAny>>,
    actions: Vec<Py<PyAny>>,
    probs: Py<PyAny>,
    rewards: Py<PyAny>,
    horizon: Option<&Bound<'py, PyAny>>,
    discount: f64,
) -> PyResult<(Bound<'py, PyDict>, Bound<'py, PyDict>)> {
    let horizon = match horizon {
        Some(value) => parse_horizon(value)?,
        None => Horizon::default(),
    };
    let config = SolverConfig {
        horizon,
        discount,
        ..SolverConfig::default()
    };
    config.validate().map_err(solver_err_to_py)?;
    ensure_distinct(py, &states, "state")?;
    ensure_distinct(py, &actions, "action")?;

    let state_positions: Vec<usize> = (0..states.len()).collect();
    let action_positions: Vec<usize> = (0..actions.len()).collect();
    let model = PyCallbackModel {
        states,
        actions,
        probs,
        rewards,
    };

    // Callbacks take the GIL themselves; release it for the duration of the run.
    let solution = py
        .allow_threads(|| {
            try_value_iteration(&state_positions, &action_positions, &model, &config)
        })
        .map_err(|err| match err {
            SolveError::Solver(err) => solver_err_to_py(err),
            SolveError::Model(py_err) => py_err,
        })?;

    let policy = PyDict::new_bound(py);
    let values = PyDict::new_bound(py);
    for (state, action, value) in solution.iter() {
        let key = model.states[*state].bind(py);
        policy.set_item(key, model.actions[*action].bind(py))?;
        values.set_item(key, value)?;
    }
    Ok((policy, values))
}

#[pyclass(name = "TabularMdp", module = "valit.mdp")]
#[derive(Clone)]
/// TabularMdp()
/// --
///
/// Immutable compiled MDP model loaded from YAML.
pub struct PyTabularMdp {
    inner: TabularMdp,
}

#[pymethods]
impl PyTabularMdp {
    /// state_count($self, /)
    /// --
    ///
    /// Return the total number of compiled states.
    #[pyo3(text_signature = "($self, /)")]
    fn state_count(&self) -> usize {
        self.inner.state_count()
    }

    /// action_count($self, /)
    /// --
    ///
    /// Return the number of actions available in every state.
    #[pyo3(text_signature = "($self, /)")]
    fn action_count(&self) -> usize {
        self.inner.action_count()
    }

    /// state_ids($self, /)
    /// --
    ///
    /// Return state ids in declaration order.
    #[pyo3(text_signature = "($self, /)")]
    fn state_ids(&self) -> Vec<String> {
        self.inner
            .state_keys()
            .into_iter()
            .filter_map(|key| self.inner.state_id(key).map(str::to_owned))
            .collect()
    }

    /// solve($self, horizon=1000, discount=1.0, /)
    /// --
    ///
    /// Run value iteration and return `(policy, values)` keyed by state id.
    ///
    /// Raises:
    ///     InvalidParameterError: For a bad discount or horizon.
    #[pyo3(signature = (horizon=None, discount=1.0))]
    #[pyo3(text_signature = "($self, horizon=1000, discount=1.0, /)")]
    fn solve(
        &self,
        py: Python<'_>,
        horizon: Option<&Bound<'_, PyAny>>,
        discount: f64,
    ) -> PyResult<(
        std::collections::HashMap<String, String>,
        std::collections::HashMap<String, f64>,
    )> {
        let horizon = match horizon {
            Some(value) => parse_horizon(value)?,
            None => Horizon::default(),
        };
        let config = SolverConfig {
            horizon,
            discount,
            ..SolverConfig::default()
        };
        py.allow_threads(|| self.inner.solve_named(&config))
            .map_err(mdp_err_to_py)
    }
}

#[pyfunction]
#[pyo3(text_signature = "(path, /)")]
/// compile_yaml_file(path, /)
/// --
///
/// Load and compile an MDP from a YAML file path.
///
/// Raises:
///     ValueError: If file loading, YAML parsing, or MDP validation fails.
fn compile_yaml_file(path: &str) -> PyResult<PyTabularMdp> {
    let mdp = compile_yaml(path).map_err(mdp_err_to_py)?;
    Ok(PyTabularMdp { inner: mdp })
}

#[pyfunction]
#[pyo3(text_signature = "(yaml, /)")]
/// compile_yaml_str(yaml, /)
/// --
///
/// Compile an MDP directly from a YAML string.
///
/// Raises:
///     ValueError: If YAML parsing or MDP validation fails.
fn compile_yaml_str(yaml: &str) -> PyResult<PyTabularMdp> {
    let spec: MdpSpec =
        serde_yaml::from_str(yaml).map_err(|err| mdp_err_to_py(MdpError::Yaml(err)))?;
    let mdp = spec.compile().map_err(mdp_err_to_py)?;
    Ok(PyTabularMdp { inner: mdp })
}

#[pymodule]
fn valit(py: Python<'_>, module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_function(wrap_pyfunction!(value_iteration, module)?)?;
    module.add(
        "InvalidParameterError",
        py.get_type_bound::<InvalidParameterError>(),
    )?;
    module.add(
        "ModelContractViolationError",
        py.get_type_bound::<ModelContractViolationError>(),
    )?;
    module.add("__version__", env!("CARGO_PKG_VERSION"))?;

    let mdp_mod = PyModule::new_bound(py, "mdp")?;
    mdp_mod.add_class::<PyTabularMdp>()?;
    mdp_mod.add_function(wrap_pyfunction!(compile_yaml_file, &mdp_mod)?)?;
    mdp_mod.add_function(wrap_pyfunction!(compile_yaml_str, &mdp_mod)?)?;
    module.add_submodule(&mdp_mod)?;

    let sys_modules = py.import_bound("sys")?.getattr("modules")?;
    sys_modules.set_item("valit.mdp", &mdp_mod)?;

    Ok(())
}
