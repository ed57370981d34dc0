use std::collections::HashMap;

use log::debug;
use valit_core::{MdpModel, Solution, SolverConfig, value_iteration};

use crate::{MdpError, MdpSpec};

/// Floating point tolerance used when validating probability sums.
pub(crate) const PROB_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Dense index for states in a compiled MDP.
pub struct StateKey(usize);

impl StateKey {
    /// Return the underlying state index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for StateKey {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
/// Dense index for actions in a compiled MDP.
pub struct ActionKey(usize);

impl ActionKey {
    /// Return the underlying action index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for ActionKey {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Solution over compiled keys.
pub type TabularSolution = Solution<StateKey, ActionKey>;

#[derive(Debug, Clone)]
/// Runtime form of an MDP with dense transition rows and precomputed CDFs.
///
/// Terminal states are absorbing: every action loops back with reward 0.
pub struct TabularMdp {
    state_ids: Vec<String>,
    state_id_to_key: HashMap<String, StateKey>,
    action_ids: Vec<String>,
    action_id_to_key: HashMap<String, ActionKey>,
    terminal: Vec<bool>,
    /// Row-major `(state, action)` records.
    rows: Vec<ActionRec>,
}

#[derive(Debug, Clone)]
struct ActionRec {
    probs: Vec<f64>,
    expected_reward: f64,
    outcomes: Vec<OutcomeRec>,
    cdf: Vec<f64>,
}

#[derive(Debug, Clone)]
struct OutcomeRec {
    next: StateKey,
    reward: f64,
}

impl ActionRec {
    fn absorbing(state: StateKey, state_count: usize) -> Self {
        let mut probs = vec![0.0; state_count];
        probs[state.index()] = 1.0;
        ActionRec {
            probs,
            expected_reward: 0.0,
            outcomes: vec![OutcomeRec {
                next: state,
                reward: 0.0,
            }],
            cdf: vec![1.0],
        }
    }
}

impl TabularMdp {
    /// Compile and validate a spec into a fast runtime representation.
    pub(crate) fn from_spec(spec: &MdpSpec) -> Result<Self, MdpError> {
        spec.validate_with_tolerance(PROB_TOLERANCE)?;

        let state_count = spec.states.len();
        let mut state_id_to_key = HashMap::with_capacity(state_count);
        let mut state_ids = Vec::with_capacity(state_count);
        for (idx, state) in spec.states.iter().enumerate() {
            state_id_to_key.insert(state.id.clone(), StateKey::from(idx));
            state_ids.push(state.id.clone());
        }

        let action_ids = spec.actions.clone();
        let action_id_to_key: HashMap<String, ActionKey> = action_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (id.clone(), ActionKey::from(idx)))
            .collect();

        let mut terminal = Vec::with_capacity(state_count);
        let mut rows = Vec::with_capacity(state_count * action_ids.len());

        for (idx, state) in spec.states.iter().enumerate() {
            let key = StateKey::from(idx);
            let is_terminal = state.terminal.unwrap_or(false);
            terminal.push(is_terminal);

            if is_terminal {
                rows.extend((0..action_ids.len()).map(|_| ActionRec::absorbing(key, state_count)));
                continue;
            }

            let declared = state.actions.as_deref().unwrap_or(&[]);
            for action_id in &action_ids {
                let action = declared
                    .iter()
                    .find(|a| &a.id == action_id)
                    .ok_or_else(|| MdpError::MissingAction {
                        state: state.id.clone(),
                        action: action_id.clone(),
                    })?;

                let mut probs = vec![0.0; state_count];
                let mut expected_reward = 0.0_f64;
                let mut outcomes = Vec::with_capacity(action.outcomes.len());
                let mut cdf = Vec::with_capacity(action.outcomes.len());
                let mut cumulative = 0.0_f64;

                for outcome in &action.outcomes {
                    let next = state_id_to_key.get(&outcome.next).copied().ok_or_else(|| {
                        MdpError::UnknownNextState {
                            state: state.id.clone(),
                            action: action.id.clone(),
                            next: outcome.next.clone(),
                        }
                    })?;

                    // Several outcomes may share a successor.
                    probs[next.index()] += outcome.prob;
                    expected_reward += outcome.prob * outcome.reward;
                    cumulative += outcome.prob;
                    cdf.push(cumulative);
                    outcomes.push(OutcomeRec {
                        next,
                        reward: outcome.reward,
                    });
                }

                rows.push(ActionRec {
                    probs,
                    expected_reward,
                    outcomes,
                    cdf,
                });
            }
        }

        debug!(
            "compiled tabular MDP with {} states and {} actions",
            state_count,
            action_ids.len()
        );

        Ok(Self {
            state_ids,
            state_id_to_key,
            action_ids,
            action_id_to_key,
            terminal,
            rows,
        })
    }

    /// Return the number of compiled states.
    pub fn state_count(&self) -> usize {
        self.state_ids.len()
    }

    /// Return the number of actions available in every state.
    pub fn action_count(&self) -> usize {
        self.action_ids.len()
    }

    /// All state keys in declaration order.
    pub fn state_keys(&self) -> Vec<StateKey> {
        (0..self.state_count()).map(StateKey::from).collect()
    }

    /// All action keys in declaration order.
    pub fn action_keys(&self) -> Vec<ActionKey> {
        (0..self.action_count()).map(ActionKey::from).collect()
    }

    /// Check whether a state is terminal.
    pub fn is_terminal(&self, key: StateKey) -> Option<bool> {
        self.terminal.get(key.index()).copied()
    }

    /// Convert a state key back to its original string id.
    pub fn state_id(&self, key: StateKey) -> Option<&str> {
        self.state_ids.get(key.index()).map(String::as_str)
    }

    /// Convert a string id into a compiled state key.
    pub fn state_key(&self, id: &str) -> Option<StateKey> {
        self.state_id_to_key.get(id).copied()
    }

    /// Convert an action key back to its original string id.
    pub fn action_id(&self, key: ActionKey) -> Option<&str> {
        self.action_ids.get(key.index()).map(String::as_str)
    }

    /// Convert a string id into a compiled action key.
    pub fn action_key(&self, id: &str) -> Option<ActionKey> {
        self.action_id_to_key.get(id).copied()
    }

    /// Run value iteration over every compiled state and action.
    pub fn solve(&self, config: &SolverConfig) -> Result<TabularSolution, MdpError> {
        let solution = value_iteration(&self.state_keys(), &self.action_keys(), self, config)?;
        Ok(solution)
    }

    /// Run value iteration and return `(policy, values)` keyed by string ids.
    pub fn solve_named(
        &self,
        config: &SolverConfig,
    ) -> Result<(HashMap<String, String>, HashMap<String, f64>), MdpError> {
        let solution = self.solve(config)?;
        let mut policy = HashMap::with_capacity(self.state_count());
        let mut values = HashMap::with_capacity(self.state_count());

        for (state, action, value) in solution.iter() {
            let state_id = self.state_ids[state.index()].clone();
            policy.insert(state_id.clone(), self.action_ids[action.index()].clone());
            values.insert(state_id, value);
        }

        Ok((policy, values))
    }

    fn row(&self, state: StateKey, action: ActionKey) -> Option<&ActionRec> {
        if state.index() >= self.state_count() || action.index() >= self.action_count() {
            return None;
        }
        self.rows.get(state.index() * self.action_count() + action.index())
    }

    /// Sample one transition for `(state, action)` using a uniform sample in `[0, 1)`.
    pub(crate) fn sample_transition(
        &self,
        state: StateKey,
        action: ActionKey,
        sample: f64,
    ) -> Option<(StateKey, f64, bool)> {
        if *self.terminal.get(state.index())? {
            return Some((state, 0.0, true));
        }

        let row = self.row(state, action)?;
        let mut chosen_idx = row.cdf.partition_point(|p| *p <= sample);
        if chosen_idx >= row.outcomes.len() {
            chosen_idx = row.outcomes.len() - 1;
        }

        let outcome = &row.outcomes[chosen_idx];
        let next_terminal = *self.terminal.get(outcome.next.index())?;
        Some((outcome.next, outcome.reward, next_terminal))
    }
}

impl MdpModel<StateKey, ActionKey> for TabularMdp {
    fn transition(&self, state: &StateKey, action: &ActionKey) -> Vec<f64> {
        // Unknown keys yield an empty row, which the solver rejects.
        self.row(*state, *action)
            .map(|row| row.probs.clone())
            .unwrap_or_default()
    }

    fn reward(&self, state: &StateKey, action: &ActionKey) -> f64 {
        self.row(*state, *action)
            .map_or(f64::NAN, |row| row.expected_reward)
    }
}

#[cfg(test)]
mod tests {
    use crate::compile_yaml_str;

    use super::StateKey;

    const ZERO_MASS_YAML: &str = r#"
actions: [go]
states:
  - id: start
    actions:
      - id: go
        outcomes:
          - next: trap
            prob: 0.0
            reward: -100.0
          - next: goal
            prob: 1.0
            reward: 1.0
  - id: trap
    terminal: true
  - id: goal
    terminal: true
"#;

    #[test]
    fn zero_mass_outcomes_are_never_sampled() {
        let mdp = compile_yaml_str(ZERO_MASS_YAML).expect("compile should succeed");
        let start = mdp.state_key("start").expect("start exists");
        let go = mdp.action_key("go").expect("go exists");
        let goal = mdp.state_key("goal").expect("goal exists");

        for sample in [0.0, 0.5, 0.999_999] {
            let (next, reward, terminal) = mdp
                .sample_transition(start, go, sample)
                .expect("valid keys");
            assert_eq!(next, goal);
            assert_eq!(reward, 1.0);
            assert!(terminal);
        }
    }

    #[test]
    fn samples_on_a_cdf_boundary_pick_the_next_outcome() {
        let mut builder = crate::MdpBuilder::new();
        builder.add_action("flip");
        builder.add_state("coin", false);
        builder.add_state("heads", true);
        builder.add_state("tails", true);
        builder
            .add_outcome("coin", "flip", "heads", 0.5, 1.0)
            .expect("coin exists");
        builder
            .add_outcome("coin", "flip", "tails", 0.5, 0.0)
            .expect("coin exists");
        let mdp = builder.compile().expect("compile should succeed");
        let coin = StateKey::from(0);
        let flip = mdp.action_key("flip").expect("flip exists");

        let below = mdp.sample_transition(coin, flip, 0.25).expect("valid keys");
        let boundary = mdp.sample_transition(coin, flip, 0.5).expect("valid keys");

        assert_eq!(mdp.state_id(below.0), Some("heads"));
        assert_eq!(mdp.state_id(boundary.0), Some("tails"));
    }
}
