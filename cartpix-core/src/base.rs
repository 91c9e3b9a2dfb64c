//! Core functionalities.
mod agent;
mod env;
mod policy;
mod replay_buffer;
mod step;
pub use agent::Agent;
pub use env::Env;
pub use policy::{Configurable, Policy};
pub use replay_buffer::{ExperienceBufferBase, ReplayBufferBase};
use std::fmt::Debug;
pub use step::Step;

/// An observation of an environment.
///
/// Observations of pixel environments are not used as they are. The state
/// given to an agent is the difference of two consecutive observations,
/// computed with [`Obs::diff`], so that a single state carries motion.
pub trait Obs: Clone + Debug {
    /// Returns `self - prev` element-wise.
    fn diff(&self, prev: &Self) -> Self;
}

/// An action of the environment.
pub trait Act: Clone + Debug {}
