//! Batch of transitions.
use super::Transition;

/// A batch of transitions sampled from a [`TransitionStore`].
///
/// Fields are stored column-wise; the `i`-th elements of the vectors form
/// the `i`-th transition.
///
/// [`TransitionStore`]: super::TransitionStore
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionBatch<O, A> {
    /// Observations.
    pub obs: Vec<O>,

    /// Actions.
    pub act: Vec<A>,

    /// Next observations, `None` for terminal transitions.
    pub next_obs: Vec<Option<O>>,

    /// Rewards.
    pub reward: Vec<f32>,
}

impl<O, A> TransitionBatch<O, A> {
    /// Returns the number of transitions.
    pub fn len(&self) -> usize {
        self.reward.len()
    }

    /// Returns `true` if the batch has no transitions.
    pub fn is_empty(&self) -> bool {
        self.reward.is_empty()
    }

    /// Indices of the transitions having a next observation.
    pub fn non_terminal_ixs(&self) -> Vec<usize> {
        self.next_obs
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.as_ref().map(|_| i))
            .collect()
    }

    /// Unpack the data `(o_t, a_t, o_t+1, r_t)`.
    pub fn unpack(self) -> (Vec<O>, Vec<A>, Vec<Option<O>>, Vec<f32>) {
        (self.obs, self.act, self.next_obs, self.reward)
    }
}

impl<'a, O: Clone + 'a, A: Clone + 'a> std::iter::FromIterator<&'a Transition<O, A>>
    for TransitionBatch<O, A>
{
    fn from_iter<I: IntoIterator<Item = &'a Transition<O, A>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let (n, _) = iter.size_hint();
        let mut batch = Self {
            obs: Vec::with_capacity(n),
            act: Vec::with_capacity(n),
            next_obs: Vec::with_capacity(n),
            reward: Vec::with_capacity(n),
        };
        for tr in iter {
            batch.obs.push(tr.obs.clone());
            batch.act.push(tr.act.clone());
            batch.next_obs.push(tr.next_obs.clone());
            batch.reward.push(tr.reward);
        }
        batch
    }
}
