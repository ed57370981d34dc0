use rayon::prelude::*;

use crate::engine::{
    error::{ContractViolation, SolveError},
    ids::{ActionIndex, StateIndex},
    model::TryMdpModel,
};

/// Borrowed view of one solver run: enumerations, model and scalars.
pub(crate) struct Backup<'a, S, A, M> {
    pub(crate) states: &'a [S],
    pub(crate) actions: &'a [A],
    pub(crate) model: &'a M,
    pub(crate) discount: f64,
    pub(crate) tolerance: f64,
}

impl<S, A, M> Backup<'_, S, A, M>
where
    M: TryMdpModel<S, A>,
{
    /// `reward(s, a) + discount * Σ p(s' | s, a) * values[s']`, checking the model contract.
    pub(crate) fn q_value(
        &self,
        state: usize,
        action: usize,
        values: &[f64],
    ) -> Result<f64, SolveError<M::Error>> {
        let s = &self.states[state];
        let a = &self.actions[action];

        let reward = self.model.try_reward(s, a).map_err(SolveError::Model)?;
        if !reward.is_finite() {
            return Err(ContractViolation::NonFiniteReward {
                state: StateIndex::from(state),
                action: ActionIndex::from(action),
                value: reward,
            }
            .into());
        }

        let probs = self.model.try_transition(s, a).map_err(SolveError::Model)?;
        if probs.len() != values.len() {
            return Err(ContractViolation::TransitionLength {
                state: StateIndex::from(state),
                action: ActionIndex::from(action),
                expected: values.len(),
                got: probs.len(),
            }
            .into());
        }

        let mut sum = 0.0_f64;
        let mut expected = 0.0_f64;
        for (successor, (prob, value)) in probs.iter().zip(values).enumerate() {
            if !prob.is_finite() || *prob < 0.0 {
                return Err(ContractViolation::InvalidProbability {
                    state: StateIndex::from(state),
                    action: ActionIndex::from(action),
                    successor: StateIndex::from(successor),
                    value: *prob,
                }
                .into());
            }
            sum += prob;
            expected += prob * value;
        }

        // Never renormalize: a bad row is the caller's bug.
        if (sum - 1.0).abs() > self.tolerance {
            return Err(ContractViolation::ProbabilitySum {
                state: StateIndex::from(state),
                action: ActionIndex::from(action),
                sum,
                tolerance: self.tolerance,
            }
            .into());
        }

        let q = reward + self.discount * expected;
        if !q.is_finite() {
            return Err(ContractViolation::ValueOverflow {
                state: StateIndex::from(state),
                action: ActionIndex::from(action),
                value: q,
            }
            .into());
        }
        Ok(q)
    }

    /// Best action and its q-value against `values`.
    ///
    /// Ties keep the earliest action in enumeration order.
    pub(crate) fn greedy(
        &self,
        state: usize,
        values: &[f64],
    ) -> Result<(ActionIndex, f64), SolveError<M::Error>> {
        let mut best_action = 0;
        let mut best_q = self.q_value(state, 0, values)?;

        for action in 1..self.actions.len() {
            let q = self.q_value(state, action, values)?;
            if q > best_q {
                best_action = action;
                best_q = q;
            }
        }

        Ok((ActionIndex::from(best_action), best_q))
    }

    /// One synchronous sweep in enumeration order.
    ///
    /// Every state reads `previous` only; `next` is fully overwritten.
    pub(crate) fn sweep_sequential(
        &self,
        previous: &[f64],
        next: &mut [f64],
    ) -> Result<(), SolveError<M::Error>> {
        for (state, slot) in next.iter_mut().enumerate() {
            *slot = self.greedy(state, previous)?.1;
        }
        Ok(())
    }

    /// Greedy action for every state against the final values.
    pub(crate) fn policy_sequential(
        &self,
        values: &[f64],
    ) -> Result<Vec<ActionIndex>, SolveError<M::Error>> {
        (0..self.states.len())
            .map(|state| self.greedy(state, values).map(|(action, _)| action))
            .collect()
    }
}

impl<S, A, M> Backup<'_, S, A, M>
where
    S: Sync,
    A: Sync,
    M: TryMdpModel<S, A> + Sync,
    M::Error: Send,
{
    /// One synchronous sweep with states spread over the rayon pool.
    ///
    /// Each worker writes its own slot of `next`. Failures are reported for
    /// the earliest failing state, matching the sequential sweep.
    pub(crate) fn sweep_parallel(
        &self,
        previous: &[f64],
        next: &mut [f64],
    ) -> Result<(), SolveError<M::Error>> {
        let outcomes: Vec<Result<(), SolveError<M::Error>>> = next
            .par_iter_mut()
            .enumerate()
            .map(|(state, slot)| -> Result<(), SolveError<M::Error>> {
                *slot = self.greedy(state, previous)?.1;
                Ok(())
            })
            .collect();

        outcomes.into_iter().collect()
    }

    pub(crate) fn policy_parallel(
        &self,
        values: &[f64],
    ) -> Result<Vec<ActionIndex>, SolveError<M::Error>> {
        let outcomes: Vec<Result<ActionIndex, SolveError<M::Error>>> = (0..self.states.len())
            .into_par_iter()
            .map(|state| self.greedy(state, values).map(|(action, _)| action))
            .collect();

        outcomes.into_iter().collect()
    }
}

/// Largest absolute change between two value buffers.
pub(crate) fn max_delta(previous: &[f64], next: &[f64]) -> f64 {
    previous
        .iter()
        .zip(next)
        .map(|(old, new)| (new - old).abs())
        .fold(0.0, f64::max)
}
