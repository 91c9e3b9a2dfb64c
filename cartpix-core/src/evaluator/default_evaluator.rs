//! Default implementation of the [`Evaluator`] trait.
use super::Evaluator;
use crate::{record::Record, Env, Obs, Policy};
use anyhow::Result;

/// Runs a fixed number of episodes and reports the mean episode duration.
///
/// The states given to the policy are screen differences, computed in the
/// same way as during training. No transition is stored.
///
/// # Examples
///
/// ```ignore
/// let mut evaluator = DefaultEvaluator::<CartPoleEnv>::new(&env_config, 7, 10)?;
/// agent.eval();
/// let record = evaluator.evaluate(&mut agent)?;
/// println!("Mean duration: {}", record.get_scalar("eval_duration")?);
/// ```
pub struct DefaultEvaluator<E: Env> {
    n_episodes: usize,
    env: E,
}

impl<E: Env> DefaultEvaluator<E> {
    /// Constructs a new [`DefaultEvaluator`].
    pub fn new(config: &E::Config, seed: i64, n_episodes: usize) -> Result<Self> {
        Ok(Self {
            n_episodes,
            env: E::build(config, seed)?,
        })
    }

    fn run_episode<P>(&mut self, policy: &mut P) -> Result<usize>
    where
        P: Policy<E> + ?Sized,
    {
        self.env.reset()?;
        let mut last_screen = self.env.render()?;
        let mut current_screen = self.env.render()?;
        let mut duration = 0;

        loop {
            let state = current_screen.diff(&last_screen);
            let act = policy.sample(&state)?;
            let (step, _) = self.env.step(&act)?;
            duration += 1;
            if step.is_done() {
                return Ok(duration);
            }
            last_screen = current_screen;
            current_screen = self.env.render()?;
        }
    }
}

impl<E: Env> Evaluator<E> for DefaultEvaluator<E> {
    fn evaluate<P>(&mut self, policy: &mut P) -> Result<Record>
    where
        P: Policy<E> + ?Sized,
    {
        let mut total = 0usize;
        for _ in 0..self.n_episodes {
            total += self.run_episode(policy)?;
        }
        let mean = match self.n_episodes {
            0 => 0.0,
            n => total as f32 / n as f32,
        };
        Ok(Record::from_scalar("eval_duration", mean))
    }
}
