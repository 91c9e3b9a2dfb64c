//! DQN agent implemented with candle.
use super::{config::DqnConfig, explorer::EpsilonGreedy, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{argmax_first, smooth_l1_loss, td_targets, OutDim},
};
use anyhow::{Context, Result};
use cartpix_core::{
    record::{Record, RecordValue},
    replay_buffer::TransitionBatch,
    Agent, Configurable, Env, Policy, ReplayBufferBase,
};
use candle_core::{DType, Device, Tensor};
use log::debug;
use rand::{rngs::StdRng, SeedableRng};
use serde::{de::DeserializeOwned, Serialize};
use std::{
    convert::{TryFrom, TryInto},
    fmt::Debug,
    marker::PhantomData,
};

#[cfg_attr(doc, aquamarine::aquamarine)]
#[allow(clippy::upper_case_acronyms)]
/// DQN agent implemented with candle.
///
/// The agent owns a policy network, trained by [`Agent::opt`], and a target
/// network, used only to evaluate next states and replaced by a copy of the
/// policy network in [`Agent::sync_target`].
///
/// Observations are converted into tensors without batch dimension and
/// stacked. Actions are discrete indices converted from and into `i64`.
///
/// ```mermaid
/// graph LR
///     A[ReplayBufferBase]-->|TransitionBatch|B[Dqn::opt]
///     B -->|"Q(s, a)"|C[policy network]
///     B -->|"max Q(s', a')"|D[target network]
///     C -->|"copy on sync_target"|D
/// ```
pub struct Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<i64> + Into<i64>,
{
    batch_size: usize,
    discount_factor: f64,
    grad_clip: Option<f64>,
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    train: bool,
    explorer: EpsilonGreedy,
    device: Device,
    n_opts: usize,
    rng: StdRng,
    phantom: PhantomData<(E, R)>,
}

impl<E, Q, R> Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<i64> + Into<i64>,
{
    /// Stacks observations into a batch tensor.
    fn stack_obs(obs: impl IntoIterator<Item = E::Obs>, device: &Device) -> Result<Tensor> {
        let xs = obs
            .into_iter()
            .map(|o| o.try_into())
            .collect::<Result<Vec<Tensor>, _>>()?;
        Ok(Tensor::stack(&xs, 0)?.to_device(device)?)
    }

    /// Action values of a single observation, in inference mode.
    fn q_values(qnet: &DqnModel<Q>, obs: &E::Obs, device: &Device) -> Result<Vec<f32>> {
        let xs = Self::stack_obs(Some(obs.clone()), device)?;
        let q = qnet.forward_t(&xs, false)?.detach();
        Ok(q.squeeze(0)?.to_dtype(DType::F32)?.to_vec1()?)
    }

    fn update_critic(&mut self, buffer: &mut R) -> Result<f32> {
        let batch = buffer.batch(self.batch_size)?;
        let n = batch.len();
        let non_terminal_ixs = batch.non_terminal_ixs();
        let (obs, act, next_obs, reward) = batch.unpack();

        let pred = {
            let obs = Self::stack_obs(obs, &self.device)?;
            let act = act
                .into_iter()
                .map(|a| Into::<i64>::into(a) as u32)
                .collect::<Vec<_>>();
            let act = Tensor::from_vec(act, (n, 1), &self.device)?;
            self.qnet.forward_t(&obs, true)?.gather(&act, 1)?.squeeze(1)?
        };

        let tgt = {
            // Terminal entries contribute zero, an all-terminal batch needs no forward pass.
            let next_values = match non_terminal_ixs.is_empty() {
                true => vec![],
                false => {
                    let next_obs = Self::stack_obs(next_obs.into_iter().flatten(), &self.device)?;
                    self.qnet_tgt
                        .forward_t(&next_obs, false)?
                        .max(1)?
                        .detach()
                        .to_vec1::<f32>()?
                }
            };
            let tgt = td_targets(&reward, &non_terminal_ixs, &next_values, self.discount_factor)?;
            Tensor::from_vec(tgt, (n,), &self.device)?
        };

        let loss = smooth_l1_loss(&pred, &tgt)?;
        self.qnet.backward_step(&loss, self.grad_clip)?;

        Ok(loss.to_scalar::<f32>()?)
    }

    /// The number of optimization steps done.
    pub fn n_opts(&self) -> usize {
        self.n_opts
    }

    /// The explorer, holding the number of action selections so far.
    pub fn explorer(&self) -> &EpsilonGreedy {
        &self.explorer
    }

    /// Parameters of the policy network.
    pub fn policy_varmap(&self) -> &candle_nn::VarMap {
        self.qnet.get_varmap()
    }

    /// Parameters of the target network.
    pub fn target_varmap(&self) -> &candle_nn::VarMap {
        self.qnet_tgt.get_varmap()
    }
}

impl<E, Q, R> Configurable<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<i64> + Into<i64>,
{
    type Config = DqnConfig<Q::Config>;

    /// Constructs DQN agent.
    ///
    /// The target network starts as a copy of the policy network.
    fn build(config: Self::Config) -> Result<Self> {
        config.validate()?;
        let device = candle_core::Device::try_from(config.device)
            .context("Failed to open the device of DQN agent")?;
        let qnet = DqnModel::build(config.model_config.clone(), &device)?;
        let mut qnet_tgt = DqnModel::build(config.model_config, &device)?;
        qnet_tgt.copy_from(&qnet)?;

        Ok(Dqn {
            batch_size: config.batch_size,
            discount_factor: config.discount_factor,
            grad_clip: config.grad_clip,
            qnet,
            qnet_tgt,
            train: true,
            explorer: config.explorer,
            device,
            n_opts: 0,
            rng: StdRng::seed_from_u64(config.seed),
            phantom: PhantomData,
        })
    }
}

impl<E, Q, R> Policy<E> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<i64> + Into<i64>,
{
    /// Epsilon-greedy in training mode, greedy in evaluation mode.
    fn sample(&mut self, obs: &E::Obs) -> Result<E::Act> {
        let qnet = &self.qnet;
        let device = &self.device;
        let a = if self.train {
            let n_actions = qnet.out_dim as usize;
            self.explorer.action_with(n_actions, &mut self.rng, || {
                Self::q_values(qnet, obs, device)
            })?
        } else {
            argmax_first(&Self::q_values(qnet, obs, device)?).context("No action values")?
        };
        Ok((a as i64).into())
    }
}

impl<E, Q, R> Agent<E, R> for Dqn<E, Q, R>
where
    E: Env,
    Q: SubModel1<Input = Tensor, Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Debug + PartialEq + Clone,
    R: ReplayBufferBase<Batch = TransitionBatch<E::Obs, E::Act>>,
    E::Obs: TryInto<Tensor, Error = candle_core::Error>,
    E::Act: From<i64> + Into<i64>,
{
    fn train(&mut self) {
        self.train = true;
    }

    fn eval(&mut self) {
        self.train = false;
    }

    fn is_train(&self) -> bool {
        self.train
    }

    fn opt(&mut self, buffer: &mut R) -> Result<Option<Record>> {
        if buffer.len() < self.batch_size {
            return Ok(None);
        }

        let loss = self.update_critic(buffer)?;
        self.n_opts += 1;
        debug!("Optimization step {}: loss = {}", self.n_opts, loss);

        Ok(Some(Record::from_slice(&[
            ("loss", RecordValue::Scalar(loss)),
            ("eps", RecordValue::Scalar(self.explorer.threshold() as f32)),
        ])))
    }

    fn sync_target(&mut self) -> Result<()> {
        self.qnet_tgt.copy_from(&self.qnet)
    }
}
