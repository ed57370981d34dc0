use crate::{ActionSpec, MdpError, MdpSpec, OutcomeSpec, StateSpec, TabularMdp};

#[derive(Debug, Clone, Default)]
/// Struct to build MDPs
pub struct MdpBuilder {
    actions: Vec<String>,
    states: Vec<StateSpec>,
}

impl MdpBuilder {
    /// Create a new MDPBuilder
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an action available in every non-terminal state
    pub fn add_action(&mut self, id: impl Into<String>) -> &mut Self {
        self.actions.push(id.into());
        self
    }

    /// Add a new state
    /// Terminal flag if this state is absorbing
    pub fn add_state(&mut self, id: impl Into<String>, terminal: bool) -> &mut Self {
        self.states.push(StateSpec {
            id: id.into(),
            terminal: Some(terminal),
            actions: Some(Vec::new()),
        });
        self
    }

    /// Add an outcome to an action of a state
    /// Action can be stochastic so repeated calls accumulate outcomes
    pub fn add_outcome(
        &mut self,
        state_id: impl AsRef<str>,
        action_id: impl AsRef<str>,
        next: impl Into<String>,
        prob: f64,
        reward: f64,
    ) -> Result<&mut Self, MdpError> {
        let state_id = state_id.as_ref();
        let action_id = action_id.as_ref();

        if !self.actions.iter().any(|a| a == action_id) {
            return Err(MdpError::BuilderUnknownAction {
                action: action_id.to_string(),
            });
        }

        let state = self
            .states
            .iter_mut()
            .find(|s| s.id == state_id)
            .ok_or_else(|| MdpError::BuilderUnknownState {
                state: state_id.to_string(),
            })?;

        let actions = state.actions.get_or_insert_with(Vec::new);
        let position = match actions.iter().position(|a| a.id == action_id) {
            Some(position) => position,
            None => {
                actions.push(ActionSpec {
                    id: action_id.to_string(),
                    outcomes: Vec::new(),
                });
                actions.len() - 1
            }
        };

        actions[position].outcomes.push(OutcomeSpec {
            next: next.into(),
            prob,
            reward,
        });

        Ok(self)
    }

    pub fn build_spec(self) -> Result<MdpSpec, MdpError> {
        let spec = MdpSpec {
            version: Some(1),
            actions: self.actions,
            states: self.states,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn compile(self) -> Result<TabularMdp, MdpError> {
        let spec = self.build_spec()?;
        spec.compile()
    }
}
