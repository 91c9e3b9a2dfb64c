//! Train [`Agent`].
mod config;
mod sampler;
use crate::{
    record::{AggregateRecorder, Record, RecordValue::Scalar},
    replay_buffer::Transition,
    Agent, Env, ExperienceBufferBase, ReplayBufferBase,
};
use anyhow::Result;
pub use config::TrainerConfig;
use log::info;
pub use sampler::Sampler;

#[cfg_attr(doc, aquamarine::aquamarine)]
/// Manages the training loop.
///
/// # Training loop
///
/// 0. Given an agent implementing [`Agent`], a replay buffer and a recorder
///    implementing [`AggregateRecorder`].
/// 1. For `episode` in `0..num_episodes`:
///     1. Reset the environment and compute the initial state from two
///        consecutive screens (see [`Sampler::reset`]).
///     2. Take an action, step the environment and push the transition
///        into the replay buffer (see [`Sampler::sample_and_push`]).
///     3. Do an optimization step. The agent skips it while the buffer
///        holds fewer transitions than a batch.
///     4. Back to 2 until the episode ends.
///     5. Store the episode record, including `"duration"`, the number of
///        steps of the episode.
///     6. If `episode % target_update_period == 0`, copy the policy
///        parameters into the target parameters.
///     7. If `(episode + 1) % flush_record_interval == 0`, flush records.
///
/// # Interaction of objects
///
/// ```mermaid
/// graph LR
///     A[Agent]-->|Env::Act|B[Env]
///     B -->|Env::Obs|C[Sampler]
///     C -->|state|A
///     C -->|Transition|D[ReplayBufferBase]
///     D -->|TransitionBatch|A
/// ```
pub struct Trainer {
    /// The number of training episodes.
    num_episodes: usize,

    /// Interval of target synchronization in episodes.
    target_update_period: usize,

    /// Interval of flushing records in episodes.
    flush_record_interval: usize,
}

impl Trainer {
    /// Constructs a trainer.
    pub fn build(config: TrainerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            num_episodes: config.num_episodes,
            target_update_period: config.target_update_period,
            flush_record_interval: config.flush_record_interval,
        })
    }

    /// Runs an episode to its end, optimizing the agent after every step.
    ///
    /// Returns the duration of the episode and its record. The record holds
    /// the last optimization record of the agent, with `"loss"` replaced by
    /// its mean over the episode.
    pub fn train_episode<E, A, R>(
        &mut self,
        sampler: &mut Sampler<E>,
        agent: &mut A,
        buffer: &mut R,
    ) -> Result<(usize, Record)>
    where
        E: Env,
        A: Agent<E, R> + ?Sized,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        sampler.reset()?;
        let mut record = Record::empty();
        let mut losses = vec![];

        loop {
            let (record_env, is_done) = sampler.sample_and_push(agent, buffer)?;
            record.merge_inplace(record_env);

            if let Some(record_agent) = agent.opt(buffer)? {
                if let Ok(loss) = record_agent.get_scalar("loss") {
                    losses.push(loss);
                }
                record.merge_inplace(record_agent);
            }

            if is_done {
                break;
            }
        }

        if !losses.is_empty() {
            let loss = losses.iter().sum::<f32>() / losses.len() as f32;
            record.insert("loss", Scalar(loss));
        }

        Ok((sampler.episode_steps(), record))
    }

    /// Train the agent.
    ///
    /// Returns the durations of the episodes.
    pub fn train<E, A, R>(
        &mut self,
        env: E,
        agent: &mut A,
        buffer: &mut R,
        recorder: &mut dyn AggregateRecorder,
    ) -> Result<Vec<usize>>
    where
        E: Env,
        A: Agent<E, R> + ?Sized,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>> + ReplayBufferBase,
    {
        let mut sampler = Sampler::new(env);
        let mut durations = Vec::with_capacity(self.num_episodes);
        agent.train();

        for episode in 0..self.num_episodes {
            let (duration, mut record) = self.train_episode(&mut sampler, agent, buffer)?;
            durations.push(duration);
            info!("Episode {} finished after {} steps", episode, duration);

            record.insert("episode", Scalar(episode as f32));
            record.insert("duration", Scalar(duration as f32));
            recorder.store(record);

            if episode % self.target_update_period == 0 {
                agent.sync_target()?;
                info!("Synchronized target parameters after episode {}", episode);
            }

            if (episode + 1) % self.flush_record_interval == 0 {
                recorder.flush((episode + 1) as i64);
            }
        }

        if self.num_episodes % self.flush_record_interval != 0 {
            recorder.flush(self.num_episodes as i64);
        }

        Ok(durations)
    }
}
