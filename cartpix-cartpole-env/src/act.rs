//! Action of [`CartPoleEnv`](crate::CartPoleEnv).
use cartpix_core::Act;

/// Direction of the force applied to the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartPoleAct {
    /// Push the cart to the left, index 0.
    Left,

    /// Push the cart to the right, index 1.
    Right,
}

impl Act for CartPoleAct {}

impl From<i64> for CartPoleAct {
    /// Index 0 is [`CartPoleAct::Left`], any other index is [`CartPoleAct::Right`].
    fn from(ix: i64) -> Self {
        match ix {
            0 => Self::Left,
            _ => Self::Right,
        }
    }
}

impl From<CartPoleAct> for i64 {
    fn from(act: CartPoleAct) -> Self {
        match act {
            CartPoleAct::Left => 0,
            CartPoleAct::Right => 1,
        }
    }
}
