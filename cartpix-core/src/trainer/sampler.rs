//! Experience sampling and replay buffer management.
//!
//! The [`Sampler`] owns the environment and the state of the running
//! episode. The state given to the agent is the difference between the two
//! most recent screens, so the sampler keeps the latest screen around to
//! compute the next state after each step.
use crate::{record::Record, replay_buffer::Transition, Env, ExperienceBufferBase, Obs, Policy};
use anyhow::{Context, Result};

/// Manages the sampling of transitions from the environment.
pub struct Sampler<E>
where
    E: Env,
{
    /// The environment being sampled from.
    env: E,

    /// The most recent screen.
    current_screen: Option<E::Obs>,

    /// The state of the running episode, `None` after termination.
    state: Option<E::Obs>,

    /// Steps taken in the running episode.
    episode_steps: usize,
}

impl<E> Sampler<E>
where
    E: Env,
{
    /// Creates a new sampler with the given environment.
    pub fn new(env: E) -> Self {
        Self {
            env,
            current_screen: None,
            state: None,
            episode_steps: 0,
        }
    }

    /// Starts a new episode.
    ///
    /// Resets the environment and takes two consecutive screens; the initial
    /// state is their difference.
    pub fn reset(&mut self) -> Result<()> {
        self.env.reset()?;
        let last_screen = self.env.render()?;
        let current_screen = self.env.render()?;
        self.state = Some(current_screen.diff(&last_screen));
        self.current_screen = Some(current_screen);
        self.episode_steps = 0;
        Ok(())
    }

    /// Samples a transition and pushes it to the replay buffer.
    ///
    /// Returns the record of the environment step and whether the episode
    /// has ended. The transition of the final step has no next state.
    pub fn sample_and_push<P, R>(&mut self, policy: &mut P, buffer: &mut R) -> Result<(Record, bool)>
    where
        P: Policy<E> + ?Sized,
        R: ExperienceBufferBase<Item = Transition<E::Obs, E::Act>>,
    {
        let state = self
            .state
            .take()
            .context("No running episode. Forgot to call reset()?")?;
        let last_screen = self
            .current_screen
            .take()
            .context("No screen of the running episode. Forgot to call reset()?")?;

        let act = policy.sample(&state)?;
        let (step, record) = self.env.step(&act)?;
        let current_screen = self.env.render()?;
        let is_done = step.is_done();
        self.episode_steps += 1;

        let next_state = match is_done {
            true => None,
            false => Some(current_screen.diff(&last_screen)),
        };
        buffer.push(Transition::new(state, act, next_state.clone(), step.reward))?;

        self.state = next_state;
        self.current_screen = Some(current_screen);

        Ok((record, is_done))
    }

    /// Steps taken in the running (or last) episode.
    pub fn episode_steps(&self) -> usize {
        self.episode_steps
    }

    /// Returns a reference to the environment.
    pub fn env(&self) -> &E {
        &self.env
    }
}
