//! Dynamics of the cart and the pole.
use serde::{Deserialize, Serialize};

const GRAVITY: f64 = 9.8;
const CART_MASS: f64 = 1.0;
const POLE_MASS: f64 = 0.1;
const TOTAL_MASS: f64 = CART_MASS + POLE_MASS;
/// Half of the pole length.
pub const POLE_LENGTH: f64 = 0.5;
const POLE_MASS_LENGTH: f64 = POLE_MASS * POLE_LENGTH;
const FORCE_MAG: f64 = 10.0;
const TAU: f64 = 0.02;

/// The cart position beyond which an episode terminates.
pub const X_THRESHOLD: f64 = 2.4;

/// The pole angle (in radians) beyond which an episode terminates.
pub const THETA_THRESHOLD: f64 = 12.0 * 2.0 * std::f64::consts::PI / 360.0;

/// State of the system.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CartPoleState {
    /// Cart position.
    pub x: f64,

    /// Cart velocity.
    pub x_dot: f64,

    /// Pole angle, zero when upright.
    pub theta: f64,

    /// Pole angular velocity.
    pub theta_dot: f64,
}

impl CartPoleState {
    /// Advances the state by one time step with explicit Euler integration.
    ///
    /// `push_right` selects the direction of the force applied to the cart.
    pub fn step(&self, push_right: bool) -> Self {
        let force = if push_right { FORCE_MAG } else { -FORCE_MAG };
        let (sin_theta, cos_theta) = self.theta.sin_cos();

        let temp = (force + POLE_MASS_LENGTH * self.theta_dot.powi(2) * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (POLE_LENGTH * (4.0 / 3.0 - POLE_MASS * cos_theta.powi(2) / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        Self {
            x: self.x + TAU * self.x_dot,
            x_dot: self.x_dot + TAU * x_acc,
            theta: self.theta + TAU * self.theta_dot,
            theta_dot: self.theta_dot + TAU * theta_acc,
        }
    }

    /// Whether the cart left the track or the pole fell.
    pub fn is_terminal(&self) -> bool {
        self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD
    }
}
