use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{MdpError, TabularMdp, compiled::PROB_TOLERANCE};

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Serializable MDP schema used for YAML IO and validation.
pub struct MdpSpec {
    /// Schema version for future compatibility checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    /// Action ids available in every non-terminal state, in solver order.
    pub actions: Vec<String>,
    /// All state declarations in the model, in solver order.
    pub states: Vec<StateSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A single state declaration in the MDP schema.
pub struct StateSpec {
    /// Unique state id.
    pub id: String,
    /// Whether this state is absorbing (defaults to `false` if omitted).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<bool>,
    /// Outcomes of every declared action from this state.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<ActionSpec>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// A named action and its stochastic outcomes.
pub struct ActionSpec {
    pub id: String,
    pub outcomes: Vec<OutcomeSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// One probabilistic transition for an action.
pub struct OutcomeSpec {
    pub next: String,
    pub prob: f64,
    pub reward: f64,
}

impl MdpSpec {
    /// Validate schema invariants using the crate default tolerance.
    pub fn validate(&self) -> Result<(), MdpError> {
        self.validate_with_tolerance(PROB_TOLERANCE)
    }

    /// Validate ids, action coverage, transitions, and probability constraints.
    pub fn validate_with_tolerance(&self, tolerance: f64) -> Result<(), MdpError> {
        if self.states.is_empty() {
            return Err(MdpError::NoStates);
        }
        if self.actions.is_empty() {
            return Err(MdpError::NoActions);
        }

        // Global action ids must be unique.
        let mut declared_actions = HashSet::with_capacity(self.actions.len());
        for action in &self.actions {
            if !declared_actions.insert(action.as_str()) {
                return Err(MdpError::DuplicateActionId { id: action.clone() });
            }
        }

        // State ids must be unique.
        let mut state_ids = HashSet::with_capacity(self.states.len());
        for state in &self.states {
            if !state_ids.insert(state.id.as_str()) {
                return Err(MdpError::DuplicateStateId {
                    id: state.id.clone(),
                });
            }
        }

        for state in &self.states {
            let terminal = state.terminal.unwrap_or(false);
            let actions = state.actions.as_deref().unwrap_or(&[]);

            if terminal {
                if !actions.is_empty() {
                    return Err(MdpError::TerminalStateHasActions {
                        state: state.id.clone(),
                    });
                }
                continue;
            }

            let mut defined = HashSet::with_capacity(actions.len());
            for action in actions {
                if !declared_actions.contains(action.id.as_str()) {
                    return Err(MdpError::UndeclaredAction {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }
                if !defined.insert(action.id.as_str()) {
                    return Err(MdpError::DuplicateStateAction {
                        state: state.id.clone(),
                        action: action.id.clone(),
                    });
                }

                validate_outcomes(&state.id, action, &state_ids, tolerance)?;
            }

            // The solver evaluates every action in every state.
            if let Some(missing) = self
                .actions
                .iter()
                .find(|action| !defined.contains(action.as_str()))
            {
                return Err(MdpError::MissingAction {
                    state: state.id.clone(),
                    action: missing.clone(),
                });
            }
        }

        Ok(())
    }

    /// Compile this spec into the runtime representation.
    pub fn compile(&self) -> Result<TabularMdp, MdpError> {
        TabularMdp::from_spec(self)
    }
}

fn validate_outcomes(
    state: &str,
    action: &ActionSpec,
    state_ids: &HashSet<&str>,
    tolerance: f64,
) -> Result<(), MdpError> {
    if action.outcomes.is_empty() {
        return Err(MdpError::EmptyOutcomes {
            state: state.to_string(),
            action: action.id.clone(),
        });
    }

    let mut sum = 0.0_f64;
    for (i, outcome) in action.outcomes.iter().enumerate() {
        if !outcome.prob.is_finite() || outcome.prob < 0.0 {
            return Err(MdpError::InvalidProbability {
                state: state.to_string(),
                action: action.id.clone(),
                outcome_index: i,
                value: outcome.prob,
            });
        }

        if !outcome.reward.is_finite() {
            return Err(MdpError::InvalidReward {
                state: state.to_string(),
                action: action.id.clone(),
                outcome_index: i,
                value: outcome.reward,
            });
        }

        if !state_ids.contains(outcome.next.as_str()) {
            return Err(MdpError::UnknownNextState {
                state: state.to_string(),
                action: action.id.clone(),
                next: outcome.next.clone(),
            });
        }

        sum += outcome.prob;
    }

    // Outcome probabilities for an action must sum to 1 within tolerance.
    if (sum - 1.0).abs() > tolerance {
        return Err(MdpError::ProbabilitySum {
            state: state.to_string(),
            action: action.id.clone(),
            sum,
            tolerance,
        });
    }

    Ok(())
}
