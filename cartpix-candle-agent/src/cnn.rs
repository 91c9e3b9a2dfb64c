//! Convolutional Q-network for screen differences.
mod base;
mod config;
pub use base::Cnn;
pub use config::CnnConfig;
