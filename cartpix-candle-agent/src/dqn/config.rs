//! Configuration of DQN agent.
use super::{explorer::EpsilonGreedy, DqnModelConfig};
use crate::{opt::OptimizerConfig, util::OutDim, Device};
use anyhow::Result;
use cartpix_core::error::CartpixError;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`Dqn`](super::Dqn) agent.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnConfig<Q>
where
    Q: OutDim,
{
    /// Configuration of the action-value function and its optimizer.
    pub model_config: DqnModelConfig<Q>,

    /// Batch size. Optimization is skipped until the replay buffer holds
    /// this many transitions.
    pub batch_size: usize,

    /// Discount factor, in `(0, 1)`.
    pub discount_factor: f64,

    /// Bound of gradient elements. `None` disables clamping.
    pub grad_clip: Option<f64>,

    /// Action selection during training.
    pub explorer: EpsilonGreedy,

    /// Device on which the networks live.
    #[serde(default)]
    pub device: Device,

    /// Seed of the random generator used for exploration.
    pub seed: u64,
}

impl<Q> Default for DqnConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            model_config: Default::default(),
            batch_size: 128,
            discount_factor: 0.999,
            grad_clip: Some(1.0),
            explorer: EpsilonGreedy::default(),
            device: Device::Cpu,
            seed: 42,
        }
    }
}

impl<Q> DqnConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets the configuration of the action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.model_config = self.model_config.q_config(v);
        self
    }

    /// Sets the optimizer configuration.
    pub fn opt_config(mut self, v: OptimizerConfig) -> Self {
        self.model_config = self.model_config.opt_config(v);
        self
    }

    /// Sets the output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        self.model_config = self.model_config.out_dim(v);
        self
    }

    /// Sets the batch size.
    pub fn batch_size(mut self, v: usize) -> Self {
        self.batch_size = v;
        self
    }

    /// Sets the discount factor.
    pub fn discount_factor(mut self, v: f64) -> Self {
        self.discount_factor = v;
        self
    }

    /// Sets the bound of gradient elements.
    pub fn grad_clip(mut self, v: Option<f64>) -> Self {
        self.grad_clip = v;
        self
    }

    /// Sets the explorer.
    pub fn explorer(mut self, v: EpsilonGreedy) -> Self {
        self.explorer = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Sets the random seed.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), CartpixError> {
        if self.batch_size == 0 {
            return Err(CartpixError::invalid_config("batch_size", "must be at least 1"));
        }
        if !(self.discount_factor > 0.0 && self.discount_factor < 1.0) {
            return Err(CartpixError::invalid_config(
                "discount_factor",
                format!("must be in (0, 1), got {}", self.discount_factor),
            ));
        }
        if !(self.explorer.eps_decay > 0.0) {
            return Err(CartpixError::invalid_config("eps_decay", "must be positive"));
        }
        if let Some(clip) = self.grad_clip {
            if !(clip > 0.0) {
                return Err(CartpixError::invalid_config("grad_clip", "must be positive"));
            }
        }
        Ok(())
    }

    /// Constructs [`DqnConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DqnConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnn::CnnConfig;
    use tempdir::TempDir;

    #[test]
    fn test_serde_dqn_config() -> Result<()> {
        let config = DqnConfig::default()
            .q_config(CnnConfig::default())
            .opt_config(OptimizerConfig::Adam { lr: 1e-4 })
            .batch_size(32)
            .explorer(EpsilonGreedy::default().eps_decay(1000.0));

        let dir = TempDir::new("dqn_config")?;
        let path = dir.path().join("dqn_config.yaml");

        config.save(&path)?;
        let config_ = DqnConfig::<CnnConfig>::load(&path)?;
        assert_eq!(config, config_);
        Ok(())
    }

    #[test]
    fn test_validate() {
        let config = DqnConfig::<CnnConfig>::default();
        assert!(config.validate().is_ok());
        assert!(config.clone().discount_factor(1.0).validate().is_err());
        assert!(config.clone().discount_factor(0.0).validate().is_err());
        assert!(config.clone().batch_size(0).validate().is_err());
        assert!(config.grad_clip(Some(0.0)).validate().is_err());
    }
}
