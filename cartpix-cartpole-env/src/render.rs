//! Software rendering of the CartPole scene.
//!
//! The scene follows the classic 600x400 layout: a horizontal track, a black
//! cart, a brown pole hinged on a blue axle, all on a white background.
use crate::physics::{CartPoleState, POLE_LENGTH, X_THRESHOLD};
use image::{Rgb, RgbImage};

const SCREEN_WIDTH: u32 = 600;
const SCREEN_HEIGHT: u32 = 400;
/// Height of the track from the bottom of the screen.
const CART_Y: f64 = 100.0;
const POLE_WIDTH: f64 = 10.0;
const CART_WIDTH: f64 = 50.0;
const CART_HEIGHT: f64 = 30.0;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const POLE_COLOR: Rgb<u8> = Rgb([204, 153, 102]);
const AXLE_COLOR: Rgb<u8> = Rgb([127, 127, 204]);

/// Draws the state of the system into an RGB image.
#[derive(Debug, Clone)]
pub struct Renderer {
    width: u32,
    height: u32,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
        }
    }
}

impl Renderer {
    /// Width of the rendered image in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rendered image in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixels per unit of the cart position.
    pub fn scale(&self) -> f64 {
        self.width as f64 / (2.0 * X_THRESHOLD)
    }

    /// Horizontal pixel of the cart centre, truncated toward zero.
    pub fn cart_location(&self, x: f64) -> i64 {
        (x * self.scale() + self.width as f64 / 2.0) as i64
    }

    /// Renders the state.
    pub fn render(&self, state: &CartPoleState) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.width, self.height, WHITE);
        let scale = self.scale();
        let cart_x = state.x * scale + self.width as f64 / 2.0;

        // Track
        self.fill_polygon(
            &mut img,
            &[
                (0.0, CART_Y),
                (self.width as f64, CART_Y),
                (self.width as f64, CART_Y + 1.0),
                (0.0, CART_Y + 1.0),
            ],
            BLACK,
        );

        // Cart
        let (l, r) = (cart_x - CART_WIDTH / 2.0, cart_x + CART_WIDTH / 2.0);
        let (b, t) = (CART_Y - CART_HEIGHT / 2.0, CART_Y + CART_HEIGHT / 2.0);
        self.fill_polygon(&mut img, &[(l, b), (r, b), (r, t), (l, t)], BLACK);

        // Pole, rotated around the axle
        let axle_y = CART_Y + CART_HEIGHT / 4.0;
        let pole_len = scale * 2.0 * POLE_LENGTH;
        let (sin, cos) = (-state.theta).sin_cos();
        let corners = [
            (-POLE_WIDTH / 2.0, -POLE_WIDTH / 2.0),
            (POLE_WIDTH / 2.0, -POLE_WIDTH / 2.0),
            (POLE_WIDTH / 2.0, pole_len - POLE_WIDTH / 2.0),
            (-POLE_WIDTH / 2.0, pole_len - POLE_WIDTH / 2.0),
        ];
        let pole = corners
            .iter()
            .map(|&(px, py)| (cart_x + px * cos - py * sin, axle_y + px * sin + py * cos))
            .collect::<Vec<_>>();
        self.fill_polygon(&mut img, &pole, POLE_COLOR);

        // Axle
        self.fill_circle(&mut img, (cart_x, axle_y), POLE_WIDTH / 2.0, AXLE_COLOR);

        img
    }

    /// Row of the image for a height measured from the bottom.
    fn row(&self, y: f64) -> f64 {
        self.height as f64 - y
    }

    /// Fills a convex polygon with coordinates measured from the bottom-left
    /// corner.
    fn fill_polygon(&self, img: &mut RgbImage, vertices: &[(f64, f64)], color: Rgb<u8>) {
        let vs = vertices
            .iter()
            .map(|&(x, y)| (x, self.row(y)))
            .collect::<Vec<_>>();
        let (x0, x1) = self.span(vs.iter().map(|v| v.0), self.width);
        let (y0, y1) = self.span(vs.iter().map(|v| v.1), self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let p = (px as f64 + 0.5, py as f64 + 0.5);
                if is_inside(&vs, p) {
                    img.put_pixel(px, py, color);
                }
            }
        }
    }

    fn fill_circle(&self, img: &mut RgbImage, center: (f64, f64), radius: f64, color: Rgb<u8>) {
        let (cx, cy) = (center.0, self.row(center.1));
        let (x0, x1) = self.span([cx - radius, cx + radius].iter().copied(), self.width);
        let (y0, y1) = self.span([cy - radius, cy + radius].iter().copied(), self.height);

        for py in y0..y1 {
            for px in x0..x1 {
                let (dx, dy) = (px as f64 + 0.5 - cx, py as f64 + 0.5 - cy);
                if dx * dx + dy * dy <= radius * radius {
                    img.put_pixel(px, py, color);
                }
            }
        }
    }

    /// Pixel range covering the given coordinates, clipped to `0..limit`.
    fn span(&self, vs: impl Iterator<Item = f64>, limit: u32) -> (u32, u32) {
        let (lo, hi) = vs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
        let lo = lo.floor().max(0.0).min(limit as f64) as u32;
        let hi = hi.ceil().max(0.0).min(limit as f64) as u32;
        (lo, hi)
    }
}

/// Point-in-polygon test for a convex polygon with any orientation.
fn is_inside(vs: &[(f64, f64)], p: (f64, f64)) -> bool {
    let mut sign = 0f64;
    for (i, a) in vs.iter().enumerate() {
        let b = vs[(i + 1) % vs.len()];
        let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_layout() {
        let renderer = Renderer::default();
        let img = renderer.render(&CartPoleState::default());
        assert_eq!(img.dimensions(), (600, 400));

        // Corner is background, cart body is black, axle sits on the cart.
        assert_eq!(*img.get_pixel(0, 0), WHITE);
        assert_eq!(*img.get_pixel(280, 300), BLACK);
        assert_eq!(*img.get_pixel(300, 292), AXLE_COLOR);
        // Upright pole above the cart.
        assert_eq!(*img.get_pixel(300, 250), POLE_COLOR);
        assert_eq!(*img.get_pixel(320, 250), WHITE);
        // Track away from the cart.
        assert_eq!(*img.get_pixel(50, 299), BLACK);
    }

    #[test]
    fn test_cart_follows_position() {
        let renderer = Renderer::default();
        let state = CartPoleState {
            x: 1.0,
            ..Default::default()
        };
        let img = renderer.render(&state);
        assert_eq!(renderer.cart_location(1.0), 425);
        assert_eq!(*img.get_pixel(425, 310), BLACK);
        assert_eq!(*img.get_pixel(300, 310), WHITE);
    }

    #[test]
    fn test_tilted_pole() {
        let renderer = Renderer::default();
        let state = CartPoleState {
            theta: 0.2,
            ..Default::default()
        };
        let img = renderer.render(&state);
        // Positive angle leans the pole to the right.
        let (px, py) = (300.0 + 100.0 * 0.2f64.sin(), 400.0 - 107.5 - 100.0 * 0.2f64.cos());
        assert_eq!(*img.get_pixel(px as u32, py as u32), POLE_COLOR);
        assert_eq!(*img.get_pixel(300, py as u32), WHITE);
    }

    #[test]
    fn test_is_inside() {
        let square = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        assert!(is_inside(&square, (0.5, 0.5)));
        assert!(!is_inside(&square, (1.5, 0.5)));
        let reversed = square.iter().rev().copied().collect::<Vec<_>>();
        assert!(is_inside(&reversed, (0.5, 0.5)));
    }
}
