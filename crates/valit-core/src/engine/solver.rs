use std::{collections::HashMap, hash::Hash};

use log::{debug, trace};

use crate::engine::{
    config::{SolverConfig, SweepMode},
    error::{ParameterError, SolveError, ValueIterationError},
    ids::{ActionIndex, StateIndex},
    indexer::Indexer,
    model::{MdpModel, TryMdpModel},
    sweep::{Backup, max_delta},
};

/// Metrics emitted after each completed sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SweepMetrics {
    /// 1-based sweep number.
    pub sweep: u64,
    /// Largest absolute value change over all states in this sweep.
    pub max_delta: f64,
}

/// Aggregate metrics for a complete solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveMetrics {
    pub sweeps_requested: u64,
    pub sweeps_completed: u64,
    pub final_max_delta: Option<f64>,
    /// `(state, action)` pairs evaluated, policy extraction included.
    /// Each evaluation is one reward call and one transition call.
    pub model_evaluations: u64,
}

impl SolveMetrics {
    fn new(sweeps_requested: u64) -> Self {
        SolveMetrics {
            sweeps_requested,
            sweeps_completed: 0,
            final_max_delta: None,
            model_evaluations: 0,
        }
    }

    fn record(&mut self, metrics: SweepMetrics, pairs: u64) {
        self.sweeps_completed += 1;
        self.final_max_delta = Some(metrics.max_delta);
        self.model_evaluations = self.model_evaluations.saturating_add(pairs);
    }
}

/// Optimal values and greedy policy for a finite MDP.
///
/// Values and actions are stored densely in the caller's state order.
#[derive(Debug, Clone)]
pub struct Solution<S, A>
where
    S: Clone + Eq + Hash,
{
    states: Vec<S>,
    actions: Vec<A>,
    state_index: Indexer<S>,
    values: Vec<f64>,
    policy: Vec<ActionIndex>,
    metrics: SolveMetrics,
}

impl<S, A> Solution<S, A>
where
    S: Clone + Eq + Hash,
    A: Clone,
{
    /// States in the order they were supplied.
    pub fn states(&self) -> &[S] {
        &self.states
    }

    /// Actions in the order they were supplied.
    pub fn actions(&self) -> &[A] {
        &self.actions
    }

    /// Value of every state, aligned with `states()`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Greedy action index of every state, aligned with `states()`.
    pub fn policy(&self) -> &[ActionIndex] {
        &self.policy
    }

    pub fn metrics(&self) -> &SolveMetrics {
        &self.metrics
    }

    /// Position of `state` in the state enumeration.
    pub fn state_index(&self, state: &S) -> Option<StateIndex> {
        self.state_index.index_of(state).map(StateIndex::from)
    }

    /// Value of one state, or `None` for an unknown state.
    pub fn value(&self, state: &S) -> Option<f64> {
        self.state_index
            .index_of(state)
            .map(|idx| self.values[idx])
    }

    /// Greedy action of one state, or `None` for an unknown state.
    pub fn action(&self, state: &S) -> Option<&A> {
        self.state_index
            .index_of(state)
            .map(|idx| &self.actions[self.policy[idx].index()])
    }

    /// Iterate `(state, action, value)` in state enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, &A, f64)> + '_ {
        self.states
            .iter()
            .zip(&self.policy)
            .zip(&self.values)
            .map(|((state, action), value)| (state, &self.actions[action.index()], *value))
    }

    /// Owned state -> value mapping.
    pub fn value_map(&self) -> HashMap<S, f64> {
        self.states
            .iter()
            .cloned()
            .zip(self.values.iter().copied())
            .collect()
    }

    /// Owned state -> action mapping.
    pub fn policy_map(&self) -> HashMap<S, A> {
        self.iter()
            .map(|(state, action, _)| (state.clone(), action.clone()))
            .collect()
    }

    /// Split into `(policy, values)` mappings.
    pub fn into_maps(self) -> (HashMap<S, A>, HashMap<S, f64>) {
        (self.policy_map(), self.value_map())
    }
}

/// Run value iteration over an infallible model.
///
/// Performs exactly `config.horizon` synchronous Bellman backups starting
/// from an all-zero value function, then extracts the greedy policy against
/// the final values. There is no early stopping.
pub fn value_iteration<S, A, M>(
    states: &[S],
    actions: &[A],
    model: &M,
    config: &SolverConfig,
) -> Result<Solution<S, A>, ValueIterationError>
where
    S: Clone + Eq + Hash + Sync,
    A: Clone + Eq + Hash + Sync,
    M: MdpModel<S, A> + Sync,
{
    try_value_iteration(states, actions, model, config).map_err(|err| match err {
        SolveError::Solver(err) => err,
        SolveError::Model(never) => match never {},
    })
}

/// Run value iteration over a model whose callbacks may fail.
pub fn try_value_iteration<S, A, M>(
    states: &[S],
    actions: &[A],
    model: &M,
    config: &SolverConfig,
) -> Result<Solution<S, A>, SolveError<M::Error>>
where
    S: Clone + Eq + Hash + Sync,
    A: Clone + Eq + Hash + Sync,
    M: TryMdpModel<S, A> + Sync,
    M::Error: Send,
{
    try_value_iteration_with_hook(states, actions, model, config, |_| {})
}

/// Run value iteration and invoke a callback after each completed sweep.
///
/// The callback only ever observes sweep boundaries, never a half-written
/// value buffer.
pub fn try_value_iteration_with_hook<S, A, M, FHook>(
    states: &[S],
    actions: &[A],
    model: &M,
    config: &SolverConfig,
    mut on_sweep: FHook,
) -> Result<Solution<S, A>, SolveError<M::Error>>
where
    S: Clone + Eq + Hash + Sync,
    A: Clone + Eq + Hash + Sync,
    M: TryMdpModel<S, A> + Sync,
    M::Error: Send,
    FHook: FnMut(&SweepMetrics),
{
    config.validate()?;
    if states.is_empty() {
        return Err(ParameterError::EmptyStates.into());
    }
    if actions.is_empty() {
        return Err(ParameterError::EmptyActions.into());
    }
    let state_index = Indexer::build(states).map_err(|idx| ParameterError::DuplicateState {
        state: StateIndex::from(idx),
    })?;
    Indexer::build(actions).map_err(|idx| ParameterError::DuplicateAction {
        action: ActionIndex::from(idx),
    })?;

    let sweeps = config.horizon.sweeps();
    let pairs = (states.len() as u64).saturating_mul(actions.len() as u64);
    debug!(
        "value iteration: {} states, {} actions, {} sweeps, discount {}, {:?} mode",
        states.len(),
        actions.len(),
        sweeps,
        config.discount,
        config.sweep_mode
    );

    let backup = Backup {
        states,
        actions,
        model,
        discount: config.discount,
        tolerance: config.probability_tolerance,
    };

    let mut metrics = SolveMetrics::new(sweeps);
    let mut previous = vec![0.0_f64; states.len()];
    let mut next = vec![0.0_f64; states.len()];

    for sweep in 1..=sweeps {
        match config.sweep_mode {
            SweepMode::Sequential => backup.sweep_sequential(&previous, &mut next)?,
            SweepMode::Parallel => backup.sweep_parallel(&previous, &mut next)?,
        }

        let sweep_metrics = SweepMetrics {
            sweep,
            max_delta: max_delta(&previous, &next),
        };
        std::mem::swap(&mut previous, &mut next);

        trace!("sweep {sweep}: max delta {}", sweep_metrics.max_delta);
        on_sweep(&sweep_metrics);
        metrics.record(sweep_metrics, pairs);
    }

    let policy = match config.sweep_mode {
        SweepMode::Sequential => backup.policy_sequential(&previous)?,
        SweepMode::Parallel => backup.policy_parallel(&previous)?,
    };
    metrics.model_evaluations = metrics.model_evaluations.saturating_add(pairs);

    debug!(
        "value iteration finished after {} sweeps ({} model evaluations)",
        metrics.sweeps_completed, metrics.model_evaluations
    );

    Ok(Solution {
        states: states.to_vec(),
        actions: actions.to_vec(),
        state_index,
        values: previous,
        policy,
        metrics,
    })
}
