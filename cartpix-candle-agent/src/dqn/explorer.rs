//! Exploration strategy of DQN.
use crate::util::argmax_first;
use anyhow::{anyhow, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Epsilon-greedy explorer with exponentially decaying epsilon.
///
/// The probability of a random action after `n` steps is
/// `eps_end + (eps_start - eps_end) * exp(-n / eps_decay)`.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    /// Epsilon at the first step.
    pub eps_start: f64,

    /// Epsilon in the limit.
    pub eps_end: f64,

    /// Decay constant in steps.
    pub eps_decay: f64,

    /// The number of actions selected so far.
    #[serde(default)]
    pub n_steps: usize,
}

impl Default for EpsilonGreedy {
    fn default() -> Self {
        Self {
            eps_start: 0.9,
            eps_end: 0.05,
            eps_decay: 200.0,
            n_steps: 0,
        }
    }
}

impl EpsilonGreedy {
    /// Set the epsilon value at the start.
    pub fn eps_start(mut self, v: f64) -> Self {
        self.eps_start = v;
        self
    }

    /// Set the epsilon value in the limit.
    pub fn eps_end(mut self, v: f64) -> Self {
        self.eps_end = v;
        self
    }

    /// Set the decay constant.
    pub fn eps_decay(mut self, v: f64) -> Self {
        self.eps_decay = v;
        self
    }

    /// Epsilon after `step` action selections.
    pub fn threshold_at(&self, step: usize) -> f64 {
        self.eps_end + (self.eps_start - self.eps_end) * (-(step as f64) / self.eps_decay).exp()
    }

    /// Epsilon of the next action selection.
    pub fn threshold(&self) -> f64 {
        self.threshold_at(self.n_steps)
    }

    /// Selects an action given action values of a single state.
    ///
    /// Takes the greedy action (lowest index on ties) if a uniform draw
    /// exceeds the threshold, and a uniformly random action otherwise.
    /// The step counter is incremented once per call.
    pub fn action(&mut self, q: &[f32], rng: &mut impl Rng) -> Result<usize> {
        let threshold = self.threshold();
        self.n_steps += 1;
        self.select(threshold, rng, q.len(), || Ok(q.to_vec()))
    }

    /// Same as [`EpsilonGreedy::action`], but evaluates action values only
    /// when the greedy action is taken.
    pub fn action_with<F>(&mut self, n_actions: usize, rng: &mut impl Rng, q: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        let threshold = self.threshold();
        self.n_steps += 1;
        self.select(threshold, rng, n_actions, q)
    }

    fn select<F>(&self, threshold: f64, rng: &mut impl Rng, n_actions: usize, q: F) -> Result<usize>
    where
        F: FnOnce() -> Result<Vec<f32>>,
    {
        let u = rng.gen::<f64>();
        if u > threshold {
            argmax_first(&q()?).ok_or_else(|| anyhow!("No action values"))
        } else if n_actions == 0 {
            Err(anyhow!("No action to choose from"))
        } else {
            Ok(rng.gen_range(0..n_actions))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_threshold() {
        let explorer = EpsilonGreedy::default();
        assert!((explorer.threshold_at(0) - 0.9).abs() < 1e-12);

        let expected = 0.05 + 0.85 * (-5f64).exp();
        assert!((explorer.threshold_at(1000) - expected).abs() < 1e-12);
        assert!((explorer.threshold_at(1000) - 0.05).abs() < 0.01);

        let mut prev = explorer.threshold_at(0);
        for step in 1..5000 {
            let t = explorer.threshold_at(step);
            assert!(t <= prev && t >= 0.05);
            prev = t;
        }
    }

    #[test]
    fn test_counter_increments_once_per_call() -> Result<()> {
        let mut explorer = EpsilonGreedy::default();
        let mut rng = StdRng::seed_from_u64(0);
        for n in 1..=10 {
            explorer.action(&[0.0, 1.0], &mut rng)?;
            assert_eq!(explorer.n_steps, n);
        }
        Ok(())
    }

    #[test]
    fn test_greedy_when_epsilon_is_zero() -> Result<()> {
        let mut explorer = EpsilonGreedy::default().eps_start(0.0).eps_end(0.0);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(explorer.action(&[0.3, 0.9, 0.9], &mut rng)?, 1);
        }
        Ok(())
    }

    #[test]
    fn test_random_when_epsilon_is_one() -> Result<()> {
        let mut explorer = EpsilonGreedy::default().eps_start(1.0).eps_end(1.0);
        let mut rng = StdRng::seed_from_u64(2);
        let mut counts = [0usize; 2];
        for _ in 0..2000 {
            let a = explorer.action_with(2, &mut rng, || panic!("greedy branch taken"))?;
            counts[a] += 1;
        }
        assert!(counts[0] > 850 && counts[1] > 850, "{:?}", counts);
        Ok(())
    }
}
