// src/model/blocks.rs
// Building blocks of the classifier: the conv+norm+activation unit, the
// dense growth block, the multi-branch inception block and the auxiliary
// classifier head.

use crate::nn::activations::{Activation, Swish};
use crate::nn::layers::{AvgPool2d, BatchNorm2d, Conv2d, Dropout, Linear};
use crate::nn::module::{Mode, Module};
use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};

/// Channels added by one application of [`DenseBlock`].
pub const DENSE_GROWTH: usize = 32;

/// Convolution + batch normalization + activation, the atomic unit every
/// branch of the network is built from. The convolution carries no bias;
/// the normalization's shift takes its place.
#[derive(Debug)]
pub struct ConvBlock<T, A = Swish>
where
    T: Scalar,
    A: Activation<T>,
{
    pub conv: Conv2d<T>,
    pub bn: BatchNorm2d<T>,
    pub act: A,
}

impl<T> ConvBlock<T>
where
    T: Scalar,
{
    /// Create a swish-activated block with a square kernel.
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Self {
        Self::with_activation(in_channels, out_channels, kernel_size, stride, padding, Swish)
    }

    /// Create a 1x1 projection block, the common case in inception branches.
    pub fn new_1x1(in_channels: usize, out_channels: usize) -> Self {
        Self::new(in_channels, out_channels, 1, 1, 0)
    }
}

impl<T, A> ConvBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    /// Create a block with a custom activation unit.
    pub fn with_activation(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        stride: usize,
        padding: usize,
        act: A,
    ) -> Self {
        Self {
            conv: Conv2d::new(
                in_channels,
                out_channels,
                (kernel_size, kernel_size),
                (stride, stride),
                (padding, padding),
                false,
            ),
            bn: BatchNorm2d::new(out_channels),
            act,
        }
    }

    /// Number of channels this block produces.
    pub fn out_channels(&self) -> usize {
        self.conv.out_channels
    }
}

impl<T, A> Module<T> for ConvBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        let convolved = self.conv.forward(input, mode)?;
        let normalized = self.bn.forward(&convolved, mode)?;
        Ok(self.act.apply(&normalized))
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = self.conv.parameters();
        params.extend(self.bn.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = self.conv.parameters_mut();
        params.extend(self.bn.parameters_mut());
        params
    }
}

/// Dense growth block: concatenates its input with a 32-channel transform
/// of itself, `[n, c, h, w] -> [n, c + 32, h, w]`.
///
/// The transform is pre-activated (norm and activation before each 1x1
/// convolution) and purely channel-wise, so spatial dimensions are
/// untouched and the original signal is preserved verbatim in the first
/// `c` output channels.
#[derive(Debug)]
pub struct DenseBlock<T, A = Swish>
where
    T: Scalar,
    A: Activation<T>,
{
    pub bn1: BatchNorm2d<T>,
    pub conv1: Conv2d<T>,
    pub bn2: BatchNorm2d<T>,
    pub conv2: Conv2d<T>,
    pub act: A,
    in_channels: usize,
}

impl<T> DenseBlock<T>
where
    T: Scalar,
{
    /// Create a swish-activated dense block over `in_channels` input channels.
    pub fn new(in_channels: usize) -> Self {
        Self::with_activation(in_channels, Swish)
    }
}

impl<T, A> DenseBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    /// Create a dense block with a custom activation unit.
    pub fn with_activation(in_channels: usize, act: A) -> Self {
        Self {
            bn1: BatchNorm2d::new(in_channels),
            conv1: Conv2d::new_1x1(in_channels, DENSE_GROWTH),
            bn2: BatchNorm2d::new(DENSE_GROWTH),
            conv2: Conv2d::new_1x1(DENSE_GROWTH, DENSE_GROWTH),
            act,
            in_channels,
        }
    }

    /// Number of channels this block produces: input + 32.
    pub fn out_channels(&self) -> usize {
        self.in_channels + DENSE_GROWTH
    }
}

impl<T, A> Module<T> for DenseBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        let mut grown = self.act.apply(&self.bn1.forward(input, mode)?);
        grown = self.conv1.forward(&grown, mode)?;
        grown = self.act.apply(&self.bn2.forward(&grown, mode)?);
        grown = self.conv2.forward(&grown, mode)?;
        Tensor::concat(&[input, &grown], 1)
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = self.bn1.parameters();
        params.extend(self.conv1.parameters());
        params.extend(self.bn2.parameters());
        params.extend(self.conv2.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = self.bn1.parameters_mut();
        params.extend(self.conv1.parameters_mut());
        params.extend(self.bn2.parameters_mut());
        params.extend(self.conv2.parameters_mut());
        params
    }
}

/// Multi-branch inception block. Three branches consume the same input and
/// are concatenated on the channel axis:
///
/// - A: 1x1 projection to `num_1x1` channels,
/// - B: 1x1 reduction to `num_3x3_red` channels (the spatial 3x3/5x5/pool
///   branches of the classical design are intentionally absent),
/// - C: a [`DenseBlock`] over the full input.
///
/// Output width is `num_1x1 + num_3x3_red + in_channels + 32`. Every branch
/// is channel-only, so spatial dimensions are preserved and concatenation
/// never resamples.
///
/// The constructor keeps the canonical seven-parameter inception signature;
/// `num_3x3`, `num_5x5_red`, `num_5x5` and `num_pool_proj` belong to the
/// removed branches and do not affect the computation.
#[derive(Debug)]
pub struct InceptionBlock<T, A = Swish>
where
    T: Scalar,
    A: Activation<T>,
{
    pub one_by_one: ConvBlock<T, A>,
    pub three_by_three_red: ConvBlock<T, A>,
    pub dense: DenseBlock<T, A>,
    in_channels: usize,
}

impl<T> InceptionBlock<T>
where
    T: Scalar,
{
    /// Create a swish-activated inception block.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        in_channels: usize,
        num_1x1: usize,
        num_3x3_red: usize,
        num_3x3: usize,
        num_5x5_red: usize,
        num_5x5: usize,
        num_pool_proj: usize,
    ) -> Self {
        Self::with_activation(
            in_channels,
            num_1x1,
            num_3x3_red,
            num_3x3,
            num_5x5_red,
            num_5x5,
            num_pool_proj,
            Swish,
        )
    }
}

impl<T, A> InceptionBlock<T, A>
where
    T: Scalar,
    A: Activation<T> + Clone,
{
    /// Create an inception block with a custom activation unit.
    #[allow(clippy::too_many_arguments)]
    pub fn with_activation(
        in_channels: usize,
        num_1x1: usize,
        num_3x3_red: usize,
        _num_3x3: usize,
        _num_5x5_red: usize,
        _num_5x5: usize,
        _num_pool_proj: usize,
        act: A,
    ) -> Self {
        Self {
            one_by_one: ConvBlock::with_activation(in_channels, num_1x1, 1, 1, 0, act.clone()),
            three_by_three_red: ConvBlock::with_activation(
                in_channels,
                num_3x3_red,
                1,
                1,
                0,
                act.clone(),
            ),
            dense: DenseBlock::with_activation(in_channels, act),
            in_channels,
        }
    }
}

impl<T, A> InceptionBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    /// Number of channels this block produces:
    /// `num_1x1 + num_3x3_red + in_channels + 32`.
    pub fn out_channels(&self) -> usize {
        self.one_by_one.out_channels() + self.three_by_three_red.out_channels()
            + self.dense.out_channels()
    }

    /// Number of channels this block consumes.
    pub fn in_channels(&self) -> usize {
        self.in_channels
    }
}

impl<T, A> Module<T> for InceptionBlock<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        let branch_a = self.one_by_one.forward(input, mode)?;
        let branch_b = self.three_by_three_red.forward(input, mode)?;
        let branch_c = self.dense.forward(input, mode)?;
        Tensor::concat(&[&branch_a, &branch_b, &branch_c], 1)
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = self.one_by_one.parameters();
        params.extend(self.three_by_three_red.parameters());
        params.extend(self.dense.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = self.one_by_one.parameters_mut();
        params.extend(self.three_by_three_red.parameters_mut());
        params.extend(self.dense.parameters_mut());
        params
    }
}

/// Auxiliary classifier attached to an intermediate feature map.
///
/// Average-pools with a fixed 5x5 window at stride 3, projects to 128
/// channels with a 1x1 [`ConvBlock`], then classifies through two linear
/// layers with heavy (0.7) dropout in between. The network runs it only in
/// training mode; its logits give mid-network layers a shorter gradient
/// path. The flattened width of 2048 assumes the 4x4 pooled extent of the
/// reference 224x224 input.
#[derive(Debug)]
pub struct Auxiliary<T, A = Swish>
where
    T: Scalar,
    A: Activation<T>,
{
    pub avgpool: AvgPool2d,
    pub conv: ConvBlock<T, A>,
    pub fc1: Linear<T>,
    pub fc2: Linear<T>,
    pub dropout: Dropout,
    pub act: A,
}

/// Channel width of the auxiliary 1x1 projection.
const AUX_PROJ_CHANNELS: usize = 128;
/// Flattened feature width entering the first linear layer.
const AUX_FLAT_FEATURES: usize = 2048;
/// Hidden width between the two linear layers.
const AUX_HIDDEN: usize = 1024;

impl<T> Auxiliary<T>
where
    T: Scalar,
{
    /// Create a swish-activated auxiliary head.
    pub fn new(in_channels: usize, num_classes: usize) -> Self {
        Self::with_activation(in_channels, num_classes, Swish)
    }
}

impl<T, A> Auxiliary<T, A>
where
    T: Scalar,
    A: Activation<T> + Clone,
{
    /// Create an auxiliary head with a custom activation unit.
    pub fn with_activation(in_channels: usize, num_classes: usize, act: A) -> Self {
        Self {
            avgpool: AvgPool2d::new(5, 3),
            conv: ConvBlock::with_activation(in_channels, AUX_PROJ_CHANNELS, 1, 1, 0, act.clone()),
            fc1: Linear::new(AUX_FLAT_FEATURES, AUX_HIDDEN, true),
            fc2: Linear::new(AUX_HIDDEN, num_classes, true),
            dropout: Dropout::new(0.7),
            act,
        }
    }
}

impl<T, A> Module<T> for Auxiliary<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    /// Forward pass: produces class logits `[batch, num_classes]`.
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        let mut logits = self.avgpool.forward(input, mode)?;
        logits = self.conv.forward(&logits, mode)?;
        logits = logits.flatten_batch()?;
        logits = self.act.apply(&self.fc1.forward(&logits, mode)?);
        logits = self.dropout.forward(&logits, mode)?;
        self.fc2.forward(&logits, mode)
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = self.conv.parameters();
        params.extend(self.fc1.parameters());
        params.extend(self.fc2.parameters());
        params
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        let mut params = self.conv.parameters_mut();
        params.extend(self.fc1.parameters_mut());
        params.extend(self.fc2.parameters_mut());
        params
    }
}
