// src/nn/layers/pooling.rs
// Spatial pooling layers. Both delegate to the windowed tensor kernels;
// neither owns parameters or mode-dependent behavior.

use crate::nn::module::{Mode, Module};
use crate::tensor::{Scalar, Tensor};

/// 2D max pooling with a square window.
/// Input `[batch, channels, h, w]`, output `[batch, channels, h', w']`
/// with the usual windowed-output arithmetic. Padded positions are
/// ignored rather than compared against zero.
#[derive(Debug, Clone, Copy)]
pub struct MaxPool2d {
    kernel_size: usize,
    stride: usize,
    padding: usize,
}

impl MaxPool2d {
    /// Create a new MaxPool2d layer.
    pub fn new(kernel_size: usize, stride: usize, padding: usize) -> Self {
        Self {
            kernel_size,
            stride,
            padding,
        }
    }
}

impl<T> Module<T> for MaxPool2d
where
    T: Scalar,
{
    fn forward(&self, input: &Tensor<T>, _mode: Mode) -> Result<Tensor<T>, String> {
        input.maxpool2d(self.kernel_size, self.stride, self.padding)
    }
}

/// 2D average pooling with a square window.
#[derive(Debug, Clone, Copy)]
pub struct AvgPool2d {
    kernel_size: usize,
    stride: usize,
}

impl AvgPool2d {
    /// Create a new AvgPool2d layer (no padding).
    pub fn new(kernel_size: usize, stride: usize) -> Self {
        Self {
            kernel_size,
            stride,
        }
    }
}

impl<T> Module<T> for AvgPool2d
where
    T: Scalar,
{
    fn forward(&self, input: &Tensor<T>, _mode: Mode) -> Result<Tensor<T>, String> {
        input.avgpool2d(self.kernel_size, self.stride, 0)
    }
}
