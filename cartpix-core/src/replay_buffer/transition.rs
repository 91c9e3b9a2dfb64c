//! A single interaction with an environment.

/// A transition `(o_t, a_t, o_t+1, r_t)`.
///
/// `next_obs` is `None` when the episode terminated at this step; no future
/// reward is bootstrapped from such a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<O, A> {
    /// Observation.
    pub obs: O,

    /// Action taken at `obs`.
    pub act: A,

    /// Observation after the action, `None` at termination.
    pub next_obs: Option<O>,

    /// Reward.
    pub reward: f32,
}

impl<O, A> Transition<O, A> {
    /// Constructs a transition.
    pub fn new(obs: O, act: A, next_obs: Option<O>, reward: f32) -> Self {
        Self {
            obs,
            act,
            next_obs,
            reward,
        }
    }

    /// Returns `true` if the episode ended with this transition.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.next_obs.is_none()
    }
}
