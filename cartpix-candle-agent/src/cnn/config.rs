use crate::util::OutDim;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`Cnn`](super::Cnn).
pub struct CnnConfig {
    /// Channels of the input screen.
    pub in_channels: usize,

    /// Height of the input screen.
    pub height: usize,

    /// Width of the input screen.
    pub width: usize,

    /// The number of actions.
    pub out_dim: i64,
}

impl Default for CnnConfig {
    fn default() -> Self {
        Self {
            in_channels: 3,
            height: 40,
            width: 90,
            out_dim: 2,
        }
    }
}

impl OutDim for CnnConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}

impl CnnConfig {
    /// Constructs [`CnnConfig`].
    pub fn new(in_channels: usize, height: usize, width: usize, out_dim: i64) -> Self {
        Self {
            in_channels,
            height,
            width,
            out_dim,
        }
    }
}
