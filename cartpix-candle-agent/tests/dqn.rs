use anyhow::Result;
use candle_core::{Device, Tensor};
use candle_nn::{Init, Linear, Module, VarBuilder, VarMap};
use cartpix_candle_agent::{
    dqn::{Dqn, DqnConfig, EpsilonGreedy},
    model::SubModel1,
    opt::OptimizerConfig,
    util::OutDim,
};
use cartpix_core::{
    record::{NullRecorder, Record},
    replay_buffer::{Transition, TransitionStore, TransitionStoreConfig},
    Act, Agent, Configurable, Env, Obs, Policy, Step, Trainer, TrainerConfig,
};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

#[derive(Clone, Debug, PartialEq)]
struct Feat(Vec<f32>);

impl Obs for Feat {
    fn diff(&self, prev: &Self) -> Self {
        Feat(self.0.iter().zip(prev.0.iter()).map(|(a, b)| a - b).collect())
    }
}

impl TryFrom<Feat> for Tensor {
    type Error = candle_core::Error;

    fn try_from(obs: Feat) -> Result<Self, Self::Error> {
        let n = obs.0.len();
        Tensor::from_vec(obs.0, (n,), &Device::Cpu)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Discrete(i64);

impl Act for Discrete {}

impl From<i64> for Discrete {
    fn from(a: i64) -> Self {
        Discrete(a)
    }
}

impl From<Discrete> for i64 {
    fn from(a: Discrete) -> Self {
        a.0
    }
}

/// Walks to the right and terminates after a fixed number of steps.
struct WalkEnv {
    len: usize,
    pos: usize,
}

impl Env for WalkEnv {
    type Config = usize;
    type Obs = Feat;
    type Act = Discrete;

    fn build(config: &Self::Config, _seed: i64) -> Result<Self> {
        Ok(Self {
            len: *config,
            pos: 0,
        })
    }

    fn reset(&mut self) -> Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.pos += 1;
        let done = self.pos >= self.len;
        Ok((Step::new(a.clone(), 1.0, done, false), Record::empty()))
    }

    fn render(&mut self) -> Result<Self::Obs> {
        Ok(Feat(vec![self.pos as f32, 1.0]))
    }

    fn n_actions(&self) -> usize {
        2
    }
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
struct LinearQConfig {
    in_dim: usize,
    out_dim: i64,
    bias: f64,
}

impl OutDim for LinearQConfig {
    fn get_out_dim(&self) -> i64 {
        self.out_dim
    }

    fn set_out_dim(&mut self, v: i64) {
        self.out_dim = v;
    }
}

/// Linear action-value function, zero weights and constant bias at start.
struct LinearQ(Linear);

impl SubModel1 for LinearQ {
    type Config = LinearQConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        let out_dim = config.out_dim as usize;
        let w = vb.get_with_hints((out_dim, config.in_dim), "weight", Init::Const(0.0))?;
        let b = vb.get_with_hints(out_dim, "bias", Init::Const(config.bias))?;
        Ok(Self(Linear::new(w, Some(b))))
    }

    fn forward_t(&self, xs: &Tensor, _train: bool) -> Result<Tensor> {
        Ok(self.0.forward(xs)?)
    }
}

type Store = TransitionStore<Transition<Feat, Discrete>>;
type DqnAgent = Dqn<WalkEnv, LinearQ, Store>;

fn config(batch_size: usize) -> DqnConfig<LinearQConfig> {
    DqnConfig::default()
        .q_config(LinearQConfig {
            in_dim: 2,
            out_dim: 2,
            bias: 0.5,
        })
        .opt_config(OptimizerConfig::Adam { lr: 0.01 })
        .batch_size(batch_size)
        .discount_factor(0.999)
}

fn store(capacity: usize) -> Result<Store> {
    Ok(Store::new(&TransitionStoreConfig::default().capacity(capacity))?)
}

fn params(varmap: &VarMap) -> Vec<(String, Vec<u32>)> {
    let mut ps = varmap
        .data()
        .lock()
        .unwrap()
        .iter()
        .map(|(k, v)| {
            let vs: Vec<f32> = v.as_tensor().flatten_all().unwrap().to_vec1().unwrap();
            (k.clone(), vs.into_iter().map(f32::to_bits).collect())
        })
        .collect::<Vec<_>>();
    ps.sort();
    ps
}

fn terminal(reward: f32) -> Transition<Feat, Discrete> {
    Transition::new(Feat(vec![1.0, 2.0]), Discrete(0), None, reward)
}

#[test]
fn test_huber_loss_of_terminal_transition() -> Result<()> {
    let mut agent = DqnAgent::build(config(1))?;
    let mut buffer = store(10)?;
    buffer.push(terminal(1.0));

    // Q(s, a) = 0.5 and the target is the reward alone.
    let record = agent.opt(&mut buffer)?.expect("optimization step");
    assert!((record.get_scalar("loss")? - 0.125).abs() < 1e-6);
    assert_eq!(agent.n_opts(), 1);
    Ok(())
}

#[test]
fn test_all_terminal_batch() -> Result<()> {
    let mut agent = DqnAgent::build(config(3))?;
    let mut buffer = store(10)?;
    for _ in 0..3 {
        buffer.push(terminal(0.5));
    }

    // All residuals are zero.
    let record = agent.opt(&mut buffer)?.expect("optimization step");
    assert!(record.get_scalar("loss")?.abs() < 1e-7);
    Ok(())
}

#[test]
fn test_non_terminal_target_uses_target_network() -> Result<()> {
    let mut agent = DqnAgent::build(config(1))?;
    let mut buffer = store(10)?;
    buffer.push(Transition::new(
        Feat(vec![0.0, 0.0]),
        Discrete(1),
        Some(Feat(vec![0.0, 0.0])),
        1.0,
    ));

    // target = 1 + 0.999 * 0.5, residual 0.9995.
    let record = agent.opt(&mut buffer)?.expect("optimization step");
    let d = 1.0f32 + 0.999 * 0.5 - 0.5;
    assert!((record.get_scalar("loss")? - 0.5 * d * d).abs() < 1e-5);
    Ok(())
}

#[test]
fn test_skip_until_batch_is_available() -> Result<()> {
    let mut agent = DqnAgent::build(config(4))?;
    let mut buffer = store(10)?;
    let before = params(agent.policy_varmap());
    for _ in 0..3 {
        buffer.push(terminal(1.0));
        assert!(agent.opt(&mut buffer)?.is_none());
    }
    assert_eq!(params(agent.policy_varmap()), before);
    assert_eq!(agent.n_opts(), 0);
    Ok(())
}

#[test]
fn test_target_changes_only_on_sync() -> Result<()> {
    let mut agent = DqnAgent::build(config(1))?;
    let mut buffer = store(10)?;
    buffer.push(terminal(1.0));

    let policy0 = params(agent.policy_varmap());
    let target0 = params(agent.target_varmap());
    assert_eq!(policy0, target0);

    for _ in 0..3 {
        agent.opt(&mut buffer)?;
    }
    let policy1 = params(agent.policy_varmap());
    assert_ne!(policy1, policy0);
    assert_eq!(params(agent.target_varmap()), target0);

    agent.sync_target()?;
    assert_eq!(params(agent.target_varmap()), policy1);
    Ok(())
}

#[test]
fn test_greedy_ties_take_lowest_index() -> Result<()> {
    let mut agent = DqnAgent::build(config(1))?;
    agent.eval();
    for _ in 0..10 {
        assert_eq!(agent.sample(&Feat(vec![3.0, -1.0]))?, Discrete(0));
    }
    assert_eq!(agent.explorer().n_steps, 0);

    agent.train();
    agent.sample(&Feat(vec![3.0, -1.0]))?;
    assert_eq!(agent.explorer().n_steps, 1);
    Ok(())
}

#[test]
fn test_train_with_trainer() -> Result<()> {
    let config = config(4).explorer(EpsilonGreedy::default().eps_decay(10.0));
    let mut agent = DqnAgent::build(config)?;
    let mut buffer = store(100)?;
    let env = WalkEnv::build(&5, 0)?;
    let mut trainer = Trainer::build(TrainerConfig::default().num_episodes(3))?;
    let durations = trainer.train(env, &mut agent, &mut buffer, &mut NullRecorder::default())?;

    assert_eq!(durations, vec![5, 5, 5]);
    assert_eq!(agent.explorer().n_steps, 15);
    assert_eq!(agent.n_opts(), 15 - 4 + 1);
    Ok(())
}
