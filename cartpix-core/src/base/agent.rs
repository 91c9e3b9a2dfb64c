//! Agent.
use super::{Env, Policy, ReplayBufferBase};
use crate::record::Record;
use anyhow::Result;

/// Represents a trainable policy on an environment.
///
/// A DQN-style agent owns two sets of parameters: the policy parameters,
/// updated by [`Agent::opt`], and the target parameters, replaced by a copy
/// of the policy parameters in [`Agent::sync_target`].
pub trait Agent<E: Env, R: ReplayBufferBase>: Policy<E> {
    /// Set the policy to training mode.
    fn train(&mut self);

    /// Set the policy to evaluation mode.
    fn eval(&mut self);

    /// Return if it is in training mode.
    fn is_train(&self) -> bool;

    /// Performs an optimization step.
    ///
    /// `buffer` is a replay buffer from which transitions will be taken
    /// for updating model parameters. Returns `Ok(None)` without touching
    /// the parameters when the buffer does not hold enough transitions.
    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>>;

    /// Copies the policy parameters into the target parameters.
    fn sync_target(&mut self) -> Result<()>;
}
