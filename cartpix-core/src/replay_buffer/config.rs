//! Configuration of [`TransitionStore`](super::TransitionStore).
use crate::error::CartpixError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    default::Default,
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`TransitionStore`](super::TransitionStore).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TransitionStoreConfig {
    /// The maximum number of transitions held.
    pub capacity: usize,

    /// Seed of the random generator used for sampling batches.
    pub seed: u64,
}

impl Default for TransitionStoreConfig {
    fn default() -> Self {
        Self {
            capacity: 10000,
            seed: 42,
        }
    }
}

impl TransitionStoreConfig {
    /// Sets the capacity of the replay buffer.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the random seed for sampling.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), CartpixError> {
        if self.capacity == 0 {
            return Err(CartpixError::invalid_config("capacity", "must be at least 1"));
        }
        Ok(())
    }

    /// Constructs [`TransitionStoreConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TransitionStoreConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
