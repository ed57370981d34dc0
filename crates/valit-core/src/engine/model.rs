use std::convert::Infallible;

/// Transition and reward capability of a finite MDP.
///
/// `transition` returns one probability per state, aligned with the state
/// enumeration handed to the solver. Both methods must be pure: the solver
/// calls them once per `(state, action)` pair per sweep and once more during
/// policy extraction, without memoizing anything.
pub trait MdpModel<S, A> {
    /// Probability of moving to each state after taking `action` in `state`.
    fn transition(&self, state: &S, action: &A) -> Vec<f64>;

    /// Immediate reward for taking `action` in `state`.
    fn reward(&self, state: &S, action: &A) -> f64;
}

/// Fallible form of [`MdpModel`] for callback-backed models.
///
/// Every `MdpModel` is a `TryMdpModel` that never fails.
pub trait TryMdpModel<S, A> {
    type Error;

    fn try_transition(&self, state: &S, action: &A) -> Result<Vec<f64>, Self::Error>;

    fn try_reward(&self, state: &S, action: &A) -> Result<f64, Self::Error>;
}

impl<S, A, M> TryMdpModel<S, A> for M
where
    M: MdpModel<S, A> + ?Sized,
{
    type Error = Infallible;

    fn try_transition(&self, state: &S, action: &A) -> Result<Vec<f64>, Self::Error> {
        Ok(self.transition(state, action))
    }

    fn try_reward(&self, state: &S, action: &A) -> Result<f64, Self::Error> {
        Ok(self.reward(state, action))
    }
}

/// Model assembled from a transition closure and a reward closure.
#[derive(Debug, Clone, Copy)]
pub struct FnModel<T, R> {
    transition: T,
    reward: R,
}

impl<T, R> FnModel<T, R> {
    pub fn new(transition: T, reward: R) -> Self {
        Self { transition, reward }
    }
}

impl<S, A, T, R> MdpModel<S, A> for FnModel<T, R>
where
    T: Fn(&S, &A) -> Vec<f64>,
    R: Fn(&S, &A) -> f64,
{
    fn transition(&self, state: &S, action: &A) -> Vec<f64> {
        (self.transition)(state, action)
    }

    fn reward(&self, state: &S, action: &A) -> f64 {
        (self.reward)(state, action)
    }
}
