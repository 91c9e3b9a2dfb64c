use super::CnnConfig;
use crate::model::SubModel1;
use anyhow::{ensure, Result};
use candle_core::{Device, ModuleT, Tensor};
use candle_nn::{
    batch_norm, conv::Conv2dConfig, conv2d, linear, BatchNorm, BatchNormConfig, Conv2d, Linear,
    Module, VarBuilder,
};

const KERNEL_SIZE: usize = 5;
const STRIDE: usize = 2;
const CHANNELS: [usize; 3] = [16, 32, 32];

/// Spatial size after a 5x5 convolution with stride 2 and no padding.
fn conv2d_size_out(size: usize) -> usize {
    (size - (KERNEL_SIZE - 1) - 1) / STRIDE + 1
}

/// Smallest size not less than `size` that every convolution consumes
/// without dropping rows or columns.
///
/// The gradient of a strided convolution only restores inputs with
/// `(n - KERNEL_SIZE) % STRIDE == 0`. Over three layers this holds for
/// sizes congruent to 5 modulo 8.
fn padded_size(size: usize) -> usize {
    let period = STRIDE.pow(CHANNELS.len() as u32);
    let rem = KERNEL_SIZE % period;
    size + (period + rem - size % period) % period
}

/// Convolution followed by batch normalization.
struct ConvBn {
    conv: Conv2d,
    bn: BatchNorm,
}

impl ConvBn {
    fn new(in_channels: usize, out_channels: usize, vb: VarBuilder) -> Result<Self> {
        let config = Conv2dConfig {
            stride: STRIDE,
            ..Default::default()
        };
        let conv = conv2d(in_channels, out_channels, KERNEL_SIZE, config, vb.pp("conv"))?;
        let bn = batch_norm(out_channels, BatchNormConfig::default(), vb.pp("bn"))?;
        Ok(Self { conv, bn })
    }

    fn forward_t(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = self.conv.forward(xs)?;
        Ok(self.bn.forward_t(&xs, train)?.relu()?)
    }
}

#[allow(clippy::upper_case_acronyms)]
/// Q-network on screens.
///
/// Three 5x5 convolutions with stride 2 (16, 32 and 32 channels), each
/// followed by batch normalization and ReLU, then a linear head with one
/// output per action. Input is a batch of screens of shape
/// `[batch, in_channels, height, width]`, zero-padded to a shape the
/// convolutions can be differentiated through (40x90 becomes 45x93).
pub struct Cnn {
    device: Device,
    height: usize,
    width: usize,
    convs: Vec<ConvBn>,
    head: Linear,
}

impl Cnn {
    /// The number of features fed into the linear head.
    ///
    /// Screens are zero-padded at the bottom and right before the first
    /// convolution, see [`Cnn::padded_shape`].
    pub fn linear_input_size(height: usize, width: usize) -> usize {
        let (height, width) = Self::padded_shape(height, width);
        let h = conv2d_size_out(conv2d_size_out(conv2d_size_out(height)));
        let w = conv2d_size_out(conv2d_size_out(conv2d_size_out(width)));
        h * w * CHANNELS[2]
    }

    /// Height and width of a screen after zero padding.
    pub fn padded_shape(height: usize, width: usize) -> (usize, usize) {
        (padded_size(height), padded_size(width))
    }
}

impl SubModel1 for Cnn {
    type Config = CnnConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn build(vb: VarBuilder, config: Self::Config) -> Result<Self> {
        // Smallest padded side that survives the three convolutions.
        let min_size = 29;
        let (height, width) = Self::padded_shape(config.height, config.width);
        ensure!(
            height >= min_size && width >= min_size,
            "Screen of {}x{} is too small, both sides must be larger than {}",
            config.height,
            config.width,
            min_size - STRIDE.pow(CHANNELS.len() as u32)
        );

        let device = vb.device().clone();
        let convs = vec![
            ConvBn::new(config.in_channels, CHANNELS[0], vb.pp("c1"))?,
            ConvBn::new(CHANNELS[0], CHANNELS[1], vb.pp("c2"))?,
            ConvBn::new(CHANNELS[1], CHANNELS[2], vb.pp("c3"))?,
        ];
        let head = linear(
            Self::linear_input_size(config.height, config.width),
            config.out_dim as _,
            vb.pp("head"),
        )?;

        Ok(Self {
            device,
            height: config.height,
            width: config.width,
            convs,
            head,
        })
    }

    fn forward_t(&self, xs: &Self::Input, train: bool) -> Result<Tensor> {
        let (_, _, h, w) = xs.dims4()?;
        ensure!(
            h == self.height && w == self.width,
            "Expected screens of {}x{}, got {}x{}",
            self.height,
            self.width,
            h,
            w
        );
        let (ph, pw) = Self::padded_shape(h, w);
        let mut xs = xs
            .to_device(&self.device)?
            .pad_with_zeros(2, 0, ph - h)?
            .pad_with_zeros(3, 0, pw - w)?;
        for conv in self.convs.iter() {
            xs = conv.forward_t(&xs, train)?;
        }
        Ok(self.head.forward(&xs.flatten_from(1)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::DType;
    use candle_nn::VarMap;

    #[test]
    fn test_padded_shape() {
        assert_eq!(Cnn::padded_shape(40, 90), (45, 93));
        assert_eq!(Cnn::padded_shape(45, 101), (45, 101));
        assert_eq!(Cnn::padded_shape(29, 30), (29, 37));
        for n in 22..200 {
            let mut m = padded_size(n);
            assert!(m >= n && m < n + 8);
            for _ in 0..3 {
                assert_eq!((m - KERNEL_SIZE) % STRIDE, 0, "n = {}", n);
                m = conv2d_size_out(m);
            }
        }
    }

    #[test]
    fn test_linear_input_size() {
        // 45x93 goes to 21x45, 9x21, then 3x9.
        assert_eq!(Cnn::linear_input_size(40, 90), 3 * 9 * 32);
    }

    #[test]
    fn test_backward_on_default_screen() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cnn = Cnn::build(vb, CnnConfig::default())?;
        let xs = Tensor::rand(0f32, 1f32, (4, 3, 40, 90), &Device::Cpu)?;

        let loss = cnn.forward_t(&xs, true)?.sum_all()?;
        let grads = loss.backward()?;
        for var in varmap.all_vars().iter() {
            assert!(grads.get(var).is_some());
        }
        Ok(())
    }

    #[test]
    fn test_wrong_screen_shape_is_rejected() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cnn = Cnn::build(vb, CnnConfig::default())?;
        let xs = Tensor::zeros((1, 3, 45, 101), DType::F32, &Device::Cpu)?;
        assert!(cnn.forward_t(&xs, false).is_err());
        Ok(())
    }

    #[test]
    fn test_output_shape() -> Result<()> {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let cnn = Cnn::build(vb, CnnConfig::default())?;
        let xs = Tensor::rand(0f32, 1f32, (4, 3, 40, 90), &Device::Cpu)?;

        assert_eq!(cnn.forward_t(&xs, true)?.dims(), &[4, 2]);
        assert_eq!(cnn.forward_t(&xs.narrow(0, 0, 1)?, false)?.dims(), &[1, 2]);
        Ok(())
    }

    #[test]
    fn test_too_small_screen_is_rejected() {
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        assert!(Cnn::build(vb, CnnConfig::new(3, 20, 90, 2)).is_err());
    }
}
