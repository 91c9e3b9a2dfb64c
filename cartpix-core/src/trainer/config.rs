//! Configuration of [`Trainer`](super::Trainer).
use crate::error::CartpixError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Trainer`](super::Trainer).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct TrainerConfig {
    /// The number of training episodes.
    pub num_episodes: usize,

    /// Interval of copying the policy parameters into the target parameters,
    /// in episodes.
    pub target_update_period: usize,

    /// Interval of flushing records in episodes.
    pub flush_record_interval: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            num_episodes: 50,
            target_update_period: 10,
            flush_record_interval: 10,
        }
    }
}

impl TrainerConfig {
    /// Sets the number of training episodes.
    pub fn num_episodes(mut self, v: usize) -> Self {
        self.num_episodes = v;
        self
    }

    /// Sets the interval of target synchronization in episodes.
    pub fn target_update_period(mut self, v: usize) -> Self {
        self.target_update_period = v;
        self
    }

    /// Sets the interval of flushing records in episodes.
    pub fn flush_record_interval(mut self, v: usize) -> Self {
        self.flush_record_interval = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), CartpixError> {
        if self.target_update_period == 0 {
            return Err(CartpixError::invalid_config(
                "target_update_period",
                "must be at least 1",
            ));
        }
        if self.flush_record_interval == 0 {
            return Err(CartpixError::invalid_config(
                "flush_record_interval",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Constructs [`TrainerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`TrainerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
