use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::{ActionKey, StateKey, TabularMdp, TabularSolution};

#[derive(Debug, Clone)]
/// Seeded simulator over a compiled MDP.
pub struct MdpSimulator {
    mdp: TabularMdp,
    rng: ChaCha8Rng,
}

impl MdpSimulator {
    /// Create a simulator with deterministic RNG seed.
    pub fn new(mdp: TabularMdp, seed: u64) -> Self {
        Self {
            mdp,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Borrow the underlying compiled MDP.
    pub fn mdp(&self) -> &TabularMdp {
        &self.mdp
    }

    /// Sample one `(next_state, reward, terminal)` transition.
    /// Invalid state/action inputs are treated as a no-op terminal transition.
    pub fn step(&mut self, state: StateKey, action: ActionKey) -> (StateKey, f64, bool) {
        let sample = (self.rng.next_u64() as f64) / ((u64::MAX as f64) + 1.0);
        self.mdp
            .sample_transition(state, action, sample)
            .unwrap_or((state, 0.0, true))
    }

    /// Follow the solved policy from `start` and return the discounted reward sum.
    ///
    /// Stops after `max_steps` transitions or on reaching a terminal state.
    pub fn rollout(
        &mut self,
        solution: &TabularSolution,
        start: StateKey,
        max_steps: usize,
        discount: f64,
    ) -> f64 {
        let mut state = start;
        let mut total_return = 0.0;
        let mut weight = 1.0;

        for _ in 0..max_steps {
            let Some(action) = solution.action(&state).copied() else {
                break;
            };
            let (next, reward, terminal) = self.step(state, action);
            total_return += weight * reward;
            weight *= discount;
            state = next;

            if terminal {
                break;
            }
        }

        total_return
    }

    /// Average `rollout` return over `episodes` episodes.
    pub fn evaluate(
        &mut self,
        solution: &TabularSolution,
        start: StateKey,
        episodes: usize,
        max_steps: usize,
        discount: f64,
    ) -> f64 {
        if episodes == 0 {
            return 0.0;
        }
        let total: f64 = (0..episodes)
            .map(|_| self.rollout(solution, start, max_steps, discount))
            .sum();
        total / episodes as f64
    }
}
