//! Fixed-capacity replay memory of transitions.
mod base;
mod batch;
mod config;
mod transition;
pub use base::TransitionStore;
pub use batch::TransitionBatch;
pub use config::TransitionStoreConfig;
pub use transition::Transition;
