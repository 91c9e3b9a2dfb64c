#![warn(missing_docs)]
//! Core components of a pixel-based DQN training setup.
//!
//! * [`Env`], [`Obs`], [`Act`] and [`Step`] describe an environment observed
//!   through its screen.
//! * [`Policy`] and [`Agent`] describe what is trained.
//! * [`replay_buffer::TransitionStore`] is the replay memory.
//! * [`Trainer`] runs the episode-based training loop.
pub mod error;
pub mod evaluator;
pub mod record;
pub mod replay_buffer;

mod base;
pub use base::{
    Act, Agent, Configurable, Env, ExperienceBufferBase, Obs, Policy, ReplayBufferBase, Step,
};

mod trainer;
pub use trainer::{Sampler, Trainer, TrainerConfig};
