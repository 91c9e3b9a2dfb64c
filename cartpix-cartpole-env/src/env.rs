//! CartPole environment observed through its screen.
use crate::{
    act::CartPoleAct,
    config::CartPoleConfig,
    physics::CartPoleState,
    render::Renderer,
    screen::{preprocess, Screen},
};
use anyhow::Result;
use cartpix_core::{record::Record, Env, Step};
use image::RgbImage;
use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// CartPole environment.
///
/// Every step yields a reward of 1, including the step ending the episode.
/// An episode terminates when the cart leaves the track or the pole tilts
/// more than 12 degrees, and is truncated after `max_steps` steps if set.
pub struct CartPoleEnv {
    config: CartPoleConfig,
    state: CartPoleState,
    steps: usize,
    renderer: Renderer,
    rng: StdRng,
}

impl CartPoleEnv {
    /// Current state of the system.
    pub fn state(&self) -> &CartPoleState {
        &self.state
    }

    /// Steps taken since the last reset.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Renders the current state without preprocessing.
    pub fn render_rgb(&self) -> RgbImage {
        self.renderer.render(&self.state)
    }
}

impl Env for CartPoleEnv {
    type Config = CartPoleConfig;
    type Obs = Screen;
    type Act = CartPoleAct;

    fn build(config: &Self::Config, seed: i64) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.clone(),
            state: CartPoleState::default(),
            steps: 0,
            renderer: Renderer::default(),
            rng: StdRng::seed_from_u64(seed as u64),
        })
    }

    fn reset(&mut self) -> Result<()> {
        let r = self.config.init_range;
        let rng = &mut self.rng;
        let mut sample = || match r > 0.0 {
            true => rng.gen_range(-r..r),
            false => 0.0,
        };
        self.state = CartPoleState {
            x: sample(),
            x_dot: sample(),
            theta: sample(),
            theta_dot: sample(),
        };
        self.steps = 0;
        trace!("Reset to {:?}", self.state);
        Ok(())
    }

    fn step(&mut self, a: &Self::Act) -> Result<(Step<Self>, Record)> {
        self.state = self.state.step(*a == CartPoleAct::Right);
        self.steps += 1;

        let is_terminated = self.state.is_terminal();
        let is_truncated = match self.config.max_steps {
            Some(n) => !is_terminated && self.steps >= n,
            None => false,
        };

        let step = Step::new(*a, 1.0, is_terminated, is_truncated);
        Ok((step, Record::empty()))
    }

    fn render(&mut self) -> Result<Self::Obs> {
        let img = self.renderer.render(&self.state);
        let cart_location = self.renderer.cart_location(self.state.x);
        preprocess(&img, cart_location, &self.config.screen)
    }

    fn n_actions(&self) -> usize {
        2
    }
}
