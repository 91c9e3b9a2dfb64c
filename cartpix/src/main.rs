use anyhow::{Context, Result};
use cartpix_candle_agent::{
    cnn::{Cnn, CnnConfig},
    dqn::{Dqn, DqnConfig, EpsilonGreedy},
    opt::OptimizerConfig,
    Device,
};
use cartpix_cartpole_env::{render::Renderer, CartPoleAct, CartPoleConfig, CartPoleEnv, Screen};
use cartpix_core::{
    evaluator::{DefaultEvaluator, Evaluator as _},
    record::LogRecorder,
    replay_buffer::{Transition, TransitionStore, TransitionStoreConfig},
    Agent as _, Configurable, Env as _, Trainer, TrainerConfig,
};
use clap::Parser;
use log::info;
use std::path::{Path, PathBuf};

const BATCH_SIZE: usize = 128;
const DISCOUNT_FACTOR: f64 = 0.999;
const EPS_START: f64 = 0.9;
const EPS_END: f64 = 0.05;
const EPS_DECAY: f64 = 200.0;
const TARGET_UPDATE: usize = 10;
const REPLAY_BUFFER_CAPACITY: usize = 10000;
const NUM_EPISODES: usize = 50;
const N_EPISODES_PER_EVAL: usize = 5;

type Env = CartPoleEnv;
type ReplayBuffer = TransitionStore<Transition<Screen, CartPoleAct>>;
type Agent = Dqn<Env, Cnn, ReplayBuffer>;
type Evaluator = DefaultEvaluator<Env>;

mod config {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::{
        fs::File,
        io::{BufReader, Write},
    };

    /// Everything needed for a training run.
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct DqnCartpoleConfig {
        pub env_config: CartPoleConfig,
        pub agent_config: DqnConfig<CnnConfig>,
        pub replay_buffer_config: TransitionStoreConfig,
        pub trainer_config: TrainerConfig,
        pub n_eval_episodes: usize,
        pub seed: u64,
    }

    impl Default for DqnCartpoleConfig {
        fn default() -> Self {
            let env_config = CartPoleConfig::default();
            let agent_config = create_agent_config(&env_config);
            Self {
                env_config,
                agent_config,
                replay_buffer_config: TransitionStoreConfig::default()
                    .capacity(REPLAY_BUFFER_CAPACITY),
                trainer_config: TrainerConfig::default()
                    .num_episodes(NUM_EPISODES)
                    .target_update_period(TARGET_UPDATE),
                n_eval_episodes: N_EPISODES_PER_EVAL,
                seed: 42,
            }
        }
    }

    impl DqnCartpoleConfig {
        /// Sets the seed of the environment, the agent and the replay buffer.
        pub fn seed(mut self, seed: u64) -> Self {
            self.seed = seed;
            self.agent_config = self.agent_config.seed(seed);
            self.replay_buffer_config = self.replay_buffer_config.seed(seed);
            self
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self> {
            let file = File::open(path)?;
            let rdr = BufReader::new(file);
            let b = serde_yaml::from_reader(rdr)?;
            Ok(b)
        }

        pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
            let mut file = File::create(path)?;
            file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
            Ok(())
        }
    }

    /// The Q-network sees screens of the shape produced by the environment.
    pub fn create_agent_config(env_config: &CartPoleConfig) -> DqnConfig<CnnConfig> {
        let renderer = Renderer::default();
        let [c, h, w] = env_config
            .screen
            .output_shape(renderer.width(), renderer.height());
        let cnn_config = CnnConfig::new(c, h, w, 2);
        DqnConfig::default()
            .q_config(cnn_config)
            .opt_config(OptimizerConfig::default())
            .batch_size(BATCH_SIZE)
            .discount_factor(DISCOUNT_FACTOR)
            .grad_clip(Some(1.0))
            .explorer(
                EpsilonGreedy::default()
                    .eps_start(EPS_START)
                    .eps_end(EPS_END)
                    .eps_decay(EPS_DECAY),
            )
            .device(Device::Cpu)
    }
}

use config::DqnCartpoleConfig;

mod utils {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct DurationRow {
        episode: usize,
        duration: usize,
    }

    /// Writes the episode durations as CSV with a header line.
    pub fn write_durations(path: impl AsRef<Path>, durations: &[usize]) -> Result<()> {
        let path = path.as_ref();
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        for (episode, &duration) in durations.iter().enumerate() {
            wtr.serialize(DurationRow { episode, duration })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

/// Train a DQN agent on CartPole from rendered screens
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// YAML file of the run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the configuration to this YAML file and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,

    /// Number of training episodes, overrides the configuration
    #[arg(short, long)]
    episodes: Option<usize>,

    /// Random seed, overrides the configuration
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write episode durations to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn load_config(args: &Args) -> Result<DqnCartpoleConfig> {
    let mut config = match &args.config {
        Some(path) => DqnCartpoleConfig::load(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => DqnCartpoleConfig::default(),
    };
    if let Some(n) = args.episodes {
        config.trainer_config = config.trainer_config.num_episodes(n);
    }
    if let Some(seed) = args.seed {
        config = config.seed(seed);
    }
    Ok(config)
}

/// Trains the agent and returns the episode durations.
fn train(config: &DqnCartpoleConfig, csv: Option<&Path>) -> Result<Vec<usize>> {
    let env = Env::build(&config.env_config, config.seed as i64)?;
    let mut agent = Agent::build(config.agent_config.clone())?;
    let mut buffer = ReplayBuffer::new(&config.replay_buffer_config)?;
    let mut recorder = LogRecorder::new();
    let mut trainer = Trainer::build(config.trainer_config.clone())?;

    let durations = trainer.train(env, &mut agent, &mut buffer, &mut recorder)?;
    if !durations.is_empty() {
        let mean = durations.iter().sum::<usize>() as f32 / durations.len() as f32;
        let best = durations.iter().max().copied().unwrap_or(0);
        info!(
            "Trained {} episodes, mean duration {:.1}, best {}",
            durations.len(),
            mean,
            best
        );
    }

    if let Some(path) = csv {
        utils::write_durations(path, &durations)?;
        info!("Wrote episode durations to {}", path.display());
    }

    if config.n_eval_episodes > 0 {
        agent.eval();
        let mut evaluator = Evaluator::new(
            &config.env_config,
            config.seed as i64 + 1,
            config.n_eval_episodes,
        )?;
        let record = evaluator.evaluate(&mut agent)?;
        info!(
            "Greedy evaluation over {} episodes: mean duration {:.1}",
            config.n_eval_episodes,
            record.get_scalar("eval_duration")?
        );
    }

    Ok(durations)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = load_config(&args)?;

    if let Some(path) = &args.dump_config {
        config.save(path)?;
        info!("Wrote configuration to {}", path.display());
        return Ok(());
    }

    train(&config, args.csv.as_deref())?;

    Ok(())
}
