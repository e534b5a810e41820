// src/nn/layers/conv2d.rs
// 2D convolutional layer over the im2col tensor kernel.

use crate::initializers::kaiming_uniform;
use crate::nn::module::{Mode, Module};
use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};
use ndarray::Axis;

/// 2D convolutional layer with configurable kernel size, stride and padding.
/// Weight tensor has shape `[out_channels, in_channels, kernel_h, kernel_w]`
/// and is initialized with Kaiming uniform over the convolutional fan-in.
#[derive(Debug, Clone)]
pub struct Conv2d<T>
where
    T: Scalar,
{
    /// Weight tensor `[out_channels, in_channels, kernel_h, kernel_w]`.
    pub weight: Parameter<T>,
    /// Optional bias vector `[out_channels]`.
    pub bias: Option<Parameter<T>>,
    /// Number of input channels.
    pub in_channels: usize,
    /// Number of output channels.
    pub out_channels: usize,
    /// Kernel size (height, width).
    pub kernel_size: (usize, usize),
    /// Stride (height, width).
    pub stride: (usize, usize),
    /// Padding (height, width).
    pub padding: (usize, usize),
}

impl<T> Conv2d<T>
where
    T: Scalar,
{
    /// Create a new 2D convolutional layer.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
        bias: bool,
    ) -> Self {
        let weight_shape = [out_channels, in_channels, kernel_size.0, kernel_size.1];
        let fan_in = in_channels * kernel_size.0 * kernel_size.1;
        let mut weight = Parameter::from_init(&weight_shape, kaiming_uniform(fan_in));
        weight.set_name("weight".to_string());

        let bias_param = if bias {
            let mut b = Parameter::zeros(&[out_channels]);
            b.set_name("bias".to_string());
            Some(b)
        } else {
            None
        };

        Self {
            weight,
            bias: bias_param,
            in_channels,
            out_channels,
            kernel_size,
            stride,
            padding,
        }
    }

    /// Create a bias-free 1x1 convolution, the channel-projection case
    /// used throughout the inception branches.
    pub fn new_1x1(in_channels: usize, out_channels: usize) -> Self {
        Self::new(in_channels, out_channels, (1, 1), (1, 1), (0, 0), false)
    }

    /// Check if the layer has a bias.
    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }

    /// Calculate output dimensions given input dimensions.
    pub fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, String> {
        if input_shape.len() != 4 {
            return Err("Input must be 4D [batch, channels, height, width]".to_string());
        }

        let output_height =
            (input_shape[2] + 2 * self.padding.0 - self.kernel_size.0) / self.stride.0 + 1;
        let output_width =
            (input_shape[3] + 2 * self.padding.1 - self.kernel_size.1) / self.stride.1 + 1;

        Ok(vec![
            input_shape[0],
            self.out_channels,
            output_height,
            output_width,
        ])
    }
}

impl<T> Module<T> for Conv2d<T>
where
    T: Scalar,
{
    /// Forward pass: apply the convolution, then the bias if present.
    /// Input shape `[batch, in_channels, h, w]`, output shape
    /// `[batch, out_channels, h', w']`.
    fn forward(&self, input: &Tensor<T>, _mode: Mode) -> Result<Tensor<T>, String> {
        if input.ndim() != 4 {
            return Err(format!(
                "Conv2d requires 4D input [batch, channels, height, width], got shape {:?}",
                input.shape()
            ));
        }
        if input.shape()[1] != self.in_channels {
            return Err(format!(
                "Input channels {} don't match layer channels {}",
                input.shape()[1],
                self.in_channels
            ));
        }

        let output = input.conv2d(&self.weight.data, self.stride, self.padding)?;

        match self.bias {
            Some(ref bias) => {
                let bias_data = bias.data.data();
                let bias_slice = bias_data.as_slice().ok_or("Bias data not contiguous")?;
                let mut out = output.into_data();
                for (c, mut lane) in out.axis_iter_mut(Axis(1)).enumerate() {
                    let b = bias_slice[c];
                    lane.mapv_inplace(|v| v + b);
                }
                Ok(Tensor::new(out))
            }
            None => Ok(output),
        }
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = vec![&self.weight];
        if let Some(ref bias) = self.bias {
            params.push(bias);
        }
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = vec![&mut self.weight];
        if let Some(ref mut bias) = self.bias {
            params.push(bias);
        }
        params
    }
}
