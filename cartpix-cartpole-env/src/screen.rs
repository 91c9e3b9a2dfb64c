//! Screen observations and their preprocessing.
use crate::render::Renderer;
use anyhow::{ensure, Result};
use cartpix_core::{error::CartpixError, Obs};
use image::{
    imageops::{crop_imm, resize, FilterType::CatmullRom},
    RgbImage,
};
use serde::{Deserialize, Serialize};

/// A preprocessed screen in `CHW` layout.
///
/// Values of rendered screens are in `[0, 1]`. Differences of screens,
/// computed with [`Obs::diff`], are in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    data: Vec<f32>,
    shape: [usize; 3],
}

impl Screen {
    /// Creates a screen from values in `CHW` order.
    pub fn new(data: Vec<f32>, shape: [usize; 3]) -> Result<Self> {
        ensure!(
            data.len() == shape.iter().product::<usize>(),
            "{} values do not fill a screen of shape {:?}",
            data.len(),
            shape
        );
        Ok(Self { data, shape })
    }

    /// Converts an RGB image, scaling channel values to `[0, 1]`.
    pub fn from_image(img: &RgbImage) -> Self {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut data = vec![0f32; 3 * h * w];
        for (x, y, px) in img.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                data[c * h * w + y * w + x] = px.0[c] as f32 / 255.0;
            }
        }
        Self {
            data,
            shape: [3, h, w],
        }
    }

    /// Shape `[channels, height, width]`.
    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Values in `CHW` order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl Obs for Screen {
    fn diff(&self, prev: &Self) -> Self {
        debug_assert_eq!(self.shape, prev.shape);
        let data = self
            .data
            .iter()
            .zip(prev.data.iter())
            .map(|(a, b)| a - b)
            .collect();
        Self {
            data,
            shape: self.shape,
        }
    }
}

#[cfg(feature = "candle")]
impl std::convert::TryFrom<Screen> for candle_core::Tensor {
    type Error = candle_core::Error;

    fn try_from(screen: Screen) -> Result<Self, Self::Error> {
        let [c, h, w] = screen.shape;
        candle_core::Tensor::from_vec(screen.data, (c, h, w), &candle_core::Device::Cpu)
    }
}

/// Configuration of screen preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Top of the kept band of rows, as a fraction of the screen height.
    pub crop_top: f64,

    /// Bottom of the kept band of rows, as a fraction of the screen height.
    pub crop_bottom: f64,

    /// Width of the window around the cart, as a fraction of the screen width.
    pub view_width: f64,

    /// Length of the shorter side after resizing.
    pub size: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            crop_top: 0.4,
            crop_bottom: 0.8,
            view_width: 0.6,
            size: 40,
        }
    }
}

impl ScreenConfig {
    /// Sets the length of the shorter side after resizing.
    pub fn size(mut self, v: u32) -> Self {
        self.size = v;
        self
    }

    /// Sets the width of the window around the cart.
    pub fn view_width(mut self, v: f64) -> Self {
        self.view_width = v;
        self
    }

    /// Checks the parameters.
    pub fn validate(&self) -> Result<(), CartpixError> {
        if !(0.0 <= self.crop_top && self.crop_top < self.crop_bottom && self.crop_bottom <= 1.0) {
            return Err(CartpixError::invalid_config(
                "crop_top/crop_bottom",
                "must satisfy 0 <= crop_top < crop_bottom <= 1",
            ));
        }
        if !(self.view_width > 0.0 && self.view_width <= 1.0) {
            return Err(CartpixError::invalid_config("view_width", "must be in (0, 1]"));
        }
        if self.size == 0 {
            return Err(CartpixError::invalid_config("size", "must be at least 1"));
        }
        let renderer = Renderer::default();
        self.check_image_size(renderer.width(), renderer.height())
    }

    /// Checks that the crop of an image of the given size is not empty.
    pub fn check_image_size(&self, width: u32, height: u32) -> Result<(), CartpixError> {
        let (w, h) = self.crop_size(width, height);
        if w == 0 {
            return Err(CartpixError::invalid_config(
                "view_width",
                format!("selects no column of a {}x{} image", width, height),
            ));
        }
        if h == 0 {
            return Err(CartpixError::invalid_config(
                "crop_top/crop_bottom",
                format!("select no row of a {}x{} image", width, height),
            ));
        }
        Ok(())
    }

    /// Shape `[channels, height, width]` of screens preprocessed from
    /// images of the given size.
    pub fn output_shape(&self, width: u32, height: u32) -> [usize; 3] {
        let (w, h) = self.crop_size(width, height);
        let (w, h) = self.resized(w, h);
        [3, h as usize, w as usize]
    }

    fn crop_size(&self, width: u32, height: u32) -> (u32, u32) {
        let top = (height as f64 * self.crop_top) as u32;
        let bottom = (height as f64 * self.crop_bottom) as u32;
        let view_width = (width as f64 * self.view_width) as u32;
        (view_width.min(width), bottom.saturating_sub(top))
    }

    /// Size after resizing the shorter side to `size` with the aspect ratio kept.
    fn resized(&self, w: u32, h: u32) -> (u32, u32) {
        let size = self.size as u64;
        let (w, h) = (w as u64, h as u64);
        if h <= w {
            (((size * w) / h) as u32, self.size)
        } else {
            (self.size, ((size * h) / w) as u32)
        }
    }
}

/// Left edge of a window of `view_width` pixels centred on the cart and
/// clamped to the screen.
pub fn view_window(cart_location: i64, screen_width: u32, view_width: u32) -> u32 {
    let half = (view_width / 2) as i64;
    if cart_location < half {
        0
    } else if cart_location > screen_width as i64 - half {
        screen_width - view_width
    } else {
        (cart_location - half) as u32
    }
}

/// Crops the band of rows holding the cart, takes a window around the cart,
/// and resizes it with cubic interpolation.
///
/// Fails if the crop of `img` is empty.
pub fn preprocess(img: &RgbImage, cart_location: i64, config: &ScreenConfig) -> Result<Screen> {
    let (width, height) = img.dimensions();
    config.check_image_size(width, height)?;
    let top = (height as f64 * config.crop_top) as u32;
    let (view_width, crop_height) = config.crop_size(width, height);
    let left = view_window(cart_location, width, view_width);

    let cropped = crop_imm(img, left, top, view_width, crop_height).to_image();
    let (w, h) = config.resized(view_width, crop_height);
    Ok(Screen::from_image(&resize(&cropped, w, h, CatmullRom)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{physics::CartPoleState, render::Renderer};

    #[test]
    fn test_view_window() {
        assert_eq!(view_window(100, 600, 360), 0);
        assert_eq!(view_window(180, 600, 360), 0);
        assert_eq!(view_window(300, 600, 360), 120);
        assert_eq!(view_window(420, 600, 360), 240);
        assert_eq!(view_window(550, 600, 360), 240);
        assert_eq!(view_window(-50, 600, 360), 0);
    }

    #[test]
    fn test_output_shape() {
        let config = ScreenConfig::default();
        assert_eq!(config.output_shape(600, 400), [3, 40, 90]);
    }

    #[test]
    fn test_preprocess() -> Result<()> {
        let renderer = Renderer::default();
        let config = ScreenConfig::default();
        let state = CartPoleState::default();
        let img = renderer.render(&state);
        let screen = preprocess(&img, renderer.cart_location(state.x), &config)?;

        assert_eq!(screen.shape(), [3, 40, 90]);
        assert!(screen.data().iter().all(|v| (0.0..=1.0).contains(v)));
        // The cart is dark, the background is white.
        assert!(screen.data().iter().any(|v| *v < 0.1));
        assert!(screen.data().iter().any(|v| *v > 0.99));
        Ok(())
    }

    #[test]
    fn test_empty_view_window_is_rejected() {
        let config = ScreenConfig::default().view_width(0.001);
        assert!(config.validate().is_err());

        let renderer = Renderer::default();
        let img = renderer.render(&CartPoleState::default());
        assert!(preprocess(&img, 300, &config).is_err());
    }

    #[test]
    fn test_empty_row_band_is_rejected() {
        let config = ScreenConfig {
            crop_top: 0.5,
            crop_bottom: 0.501,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let renderer = Renderer::default();
        let img = renderer.render(&CartPoleState::default());
        assert!(preprocess(&img, 300, &config).is_err());

        // A few rows are enough.
        let config = ScreenConfig {
            crop_top: 0.5,
            crop_bottom: 0.51,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(preprocess(&img, 300, &config).map(|s| s.shape()[1]).ok(), Some(40));
    }

    #[test]
    fn test_diff() -> Result<()> {
        let a = Screen::new(vec![0.5, 1.0, 0.0], [3, 1, 1])?;
        let b = Screen::new(vec![0.25, 1.0, 1.0], [3, 1, 1])?;
        assert_eq!(a.diff(&b).data(), &[0.25, 0.0, -1.0]);
        assert!(a.diff(&a).data().iter().all(|v| *v == 0.0));
        Ok(())
    }

    #[test]
    fn test_new_checks_length() {
        assert!(Screen::new(vec![0.0; 5], [3, 1, 2]).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(ScreenConfig::default().validate().is_ok());
        assert!(ScreenConfig::default().view_width(0.0).validate().is_err());
        assert!(ScreenConfig::default().size(0).validate().is_err());
    }

    #[cfg(feature = "candle")]
    #[test]
    fn test_into_tensor() -> Result<()> {
        use std::convert::TryFrom;
        let screen = Screen::new(vec![0.0; 3 * 40 * 90], [3, 40, 90])?;
        let t = candle_core::Tensor::try_from(screen)?;
        assert_eq!(t.dims(), &[3, 40, 90]);
        Ok(())
    }
}
