//! CartPole environment observed through rendered screens.
//!
//! The system follows the classic cart-pole dynamics. Its state is not
//! exposed to agents; instead [`CartPoleEnv::render`](cartpix_core::Env::render)
//! draws the scene and preprocesses it into a [`Screen`]:
//!
//! 1. render the 600x400 scene,
//! 2. keep the band of rows between 40% and 80% of the height,
//! 3. keep a window of 60% of the width centred on the cart,
//! 4. resize to 40 pixels high with cubic interpolation.
//!
//! ```no_run
//! use anyhow::Result;
//! use cartpix_cartpole_env::{CartPoleAct, CartPoleConfig, CartPoleEnv};
//! use cartpix_core::{Env as _, Obs as _};
//!
//! fn main() -> Result<()> {
//!     let mut env = CartPoleEnv::build(&CartPoleConfig::default(), 42)?;
//!     env.reset()?;
//!     let last = env.render()?;
//!     let (step, _) = env.step(&CartPoleAct::Right)?;
//!     let state = env.render()?.diff(&last);
//!     println!("{:?} {}", state.shape(), step.is_done());
//!     Ok(())
//! }
//! ```
mod act;
mod config;
mod env;
pub mod physics;
pub mod render;
pub mod screen;
pub use act::CartPoleAct;
pub use config::CartPoleConfig;
pub use env::CartPoleEnv;
pub use screen::{Screen, ScreenConfig};
