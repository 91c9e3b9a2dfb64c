//! Configuration of [`CartPoleEnv`](crate::CartPoleEnv).
use crate::screen::ScreenConfig;
use anyhow::Result;
use cartpix_core::error::CartpixError;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`CartPoleEnv`](crate::CartPoleEnv).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleConfig {
    /// Initial state variables are drawn uniformly from `[-init_range, init_range]`.
    pub init_range: f64,

    /// Episodes are truncated after this many steps. `None` for no limit.
    pub max_steps: Option<usize>,

    /// Preprocessing of rendered screens.
    pub screen: ScreenConfig,
}

impl Default for CartPoleConfig {
    fn default() -> Self {
        Self {
            init_range: 0.05,
            max_steps: None,
            screen: ScreenConfig::default(),
        }
    }
}

impl CartPoleConfig {
    /// Sets the step limit of episodes.
    pub fn max_steps(mut self, v: Option<usize>) -> Self {
        self.max_steps = v;
        self
    }

    /// Sets the range of initial state variables.
    pub fn init_range(mut self, v: f64) -> Self {
        self.init_range = v;
        self
    }

    /// Sets screen preprocessing.
    pub fn screen(mut self, v: ScreenConfig) -> Self {
        self.screen = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), CartpixError> {
        if !(self.init_range >= 0.0) {
            return Err(CartpixError::invalid_config("init_range", "must not be negative"));
        }
        if self.max_steps == Some(0) {
            return Err(CartpixError::invalid_config("max_steps", "must be at least 1"));
        }
        self.screen.validate()
    }

    /// Constructs [`CartPoleConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`CartPoleConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
