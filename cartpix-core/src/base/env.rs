//! Environment.
use super::{Act, Obs, Step};
use crate::record::Record;
use anyhow::Result;

/// Represents an environment, typically an MDP observed through its screen.
pub trait Env {
    /// Configurations.
    type Config: Clone;

    /// Observation of the environment, i.e., a preprocessed screen.
    type Obs: Obs;

    /// Action of the environment.
    type Act: Act;

    /// Builds an environment with a given random seed.
    fn build(config: &Self::Config, seed: i64) -> Result<Self>
    where
        Self: Sized;

    /// Resets the environment to an initial state.
    fn reset(&mut self) -> Result<()>;

    /// Performs an environment step.
    ///
    /// The returned [`Step`] does not carry an observation; the screen
    /// after the step is taken with [`Env::render`].
    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)>
    where
        Self: Sized;

    /// Renders the current state and returns it as an observation.
    fn render(&mut self) -> Result<Self::Obs>;

    /// The number of discrete actions.
    fn n_actions(&self) -> usize;
}
