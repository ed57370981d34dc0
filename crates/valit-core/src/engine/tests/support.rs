use std::sync::atomic::{AtomicUsize, Ordering};

use crate::MdpModel;

/// Dense `probs[s][a][s']` / `rewards[s][a]` model over index states.
#[derive(Debug, Clone)]
pub(super) struct TableModel {
    pub(super) probs: Vec<Vec<Vec<f64>>>,
    pub(super) rewards: Vec<Vec<f64>>,
}

impl TableModel {
    /// Build from unnormalized positive weights.
    pub(super) fn from_weights(weights: Vec<Vec<Vec<f64>>>, rewards: Vec<Vec<f64>>) -> Self {
        let probs = weights
            .into_iter()
            .map(|per_action| {
                per_action
                    .into_iter()
                    .map(|row| {
                        let total: f64 = row.iter().sum();
                        row.into_iter().map(|w| w / total).collect()
                    })
                    .collect()
            })
            .collect();
        Self { probs, rewards }
    }

    pub(super) fn states(&self) -> Vec<usize> {
        (0..self.probs.len()).collect()
    }

    pub(super) fn actions(&self) -> Vec<usize> {
        (0..self.rewards.first().map_or(0, Vec::len)).collect()
    }
}

impl MdpModel<usize, usize> for TableModel {
    fn transition(&self, state: &usize, action: &usize) -> Vec<f64> {
        self.probs[*state][*action].clone()
    }

    fn reward(&self, state: &usize, action: &usize) -> f64 {
        self.rewards[*state][*action]
    }
}

/// Wraps a model and counts every callback.
#[derive(Debug)]
pub(super) struct CountingModel<M> {
    pub(super) inner: M,
    pub(super) transition_calls: AtomicUsize,
    pub(super) reward_calls: AtomicUsize,
}

impl<M> CountingModel<M> {
    pub(super) fn new(inner: M) -> Self {
        Self {
            inner,
            transition_calls: AtomicUsize::new(0),
            reward_calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn transition_calls(&self) -> usize {
        self.transition_calls.load(Ordering::SeqCst)
    }

    pub(super) fn reward_calls(&self) -> usize {
        self.reward_calls.load(Ordering::SeqCst)
    }
}

impl<M> MdpModel<usize, usize> for CountingModel<M>
where
    M: MdpModel<usize, usize>,
{
    fn transition(&self, state: &usize, action: &usize) -> Vec<f64> {
        self.transition_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.transition(state, action)
    }

    fn reward(&self, state: &usize, action: &usize) -> f64 {
        self.reward_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.reward(state, action)
    }
}

/// Straightforward Jacobi value iteration used as an oracle.
pub(super) fn reference_values(model: &TableModel, horizon: usize, discount: f64) -> Vec<f64> {
    let n = model.probs.len();
    let mut values = vec![0.0; n];
    for _ in 0..horizon {
        let mut next = vec![0.0; n];
        for (s, slot) in next.iter_mut().enumerate() {
            let mut best = f64::NEG_INFINITY;
            for a in 0..model.rewards[s].len() {
                let mut expected = 0.0;
                for (p, v) in model.probs[s][a].iter().zip(&values) {
                    expected += p * v;
                }
                let q = model.rewards[s][a] + discount * expected;
                if q > best {
                    best = q;
                }
            }
            *slot = best;
        }
        values = next;
    }
    values
}
