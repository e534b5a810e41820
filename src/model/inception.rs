// src/model/inception.rs
// The full classifier: stem, nine inception stages, two auxiliary heads
// and the final linear classifier.

use crate::nn::activations::{Activation, Swish};
use crate::nn::layers::{AvgPool2d, Dropout, Linear, MaxPool2d};
use crate::nn::module::{Mode, Module};
use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};

use super::blocks::{Auxiliary, ConvBlock, InceptionBlock};

/// Number of classes the default classifier distinguishes.
pub const DEFAULT_NUM_CLASSES: usize = 33;

/// Result of a forward pass through [`Inception`].
///
/// `auxiliary` is `Some((aux1, aux2))` only when the pass ran in
/// [`Mode::Train`] with auxiliary heads enabled; evaluation always yields
/// `None`, so callers never have to guess which outputs are meaningful.
#[derive(Debug, Clone)]
pub struct ForwardOutput<T>
where
    T: Scalar,
{
    /// Main classifier logits `[batch, num_classes]`.
    pub logits: Tensor<T>,
    /// Auxiliary logits after stages 4a and 4d, training mode only.
    pub auxiliary: Option<(Tensor<T>, Tensor<T>)>,
}

/// Inception-style convolutional classifier with dense-growth branches.
///
/// The stem reduces a `[batch, 3, 224, 224]` image to `[batch, 192, 28, 28]`,
/// then nine [`InceptionBlock`] stages grow the channel count to 3376 while
/// max pooling shrinks the spatial extent to 7x7. A 7x7 average pool,
/// dropout and a single linear layer produce the class logits. In training
/// mode two [`Auxiliary`] heads branch off after stages 4a and 4d.
///
/// Every stage widens its input by `num_1x1 + num_3x3_red + 32` channels,
/// so the cascade is fixed by the stage table below:
///
/// | stage | in   | out  |
/// |-------|------|------|
/// | 3a    | 192  | 384  |
/// | 3b    | 384  | 672  |
/// | 4a    | 672  | 992  |
/// | 4b    | 992  | 1296 |
/// | 4c    | 1296 | 1584 |
/// | 4d    | 1584 | 1872 |
/// | 4e    | 1872 | 2320 |
/// | 5a    | 2320 | 2768 |
/// | 5b    | 2768 | 3376 |
#[derive(Debug)]
pub struct Inception<T, A = Swish>
where
    T: Scalar,
    A: Activation<T>,
{
    pub conv1: ConvBlock<T, A>,
    pub conv2: ConvBlock<T, A>,

    pub inception3a: InceptionBlock<T, A>,
    pub inception3b: InceptionBlock<T, A>,
    pub inception4a: InceptionBlock<T, A>,
    pub inception4b: InceptionBlock<T, A>,
    pub inception4c: InceptionBlock<T, A>,
    pub inception4d: InceptionBlock<T, A>,
    pub inception4e: InceptionBlock<T, A>,
    pub inception5a: InceptionBlock<T, A>,
    pub inception5b: InceptionBlock<T, A>,

    pub aux1: Option<Auxiliary<T, A>>,
    pub aux2: Option<Auxiliary<T, A>>,

    pub maxpool: MaxPool2d,
    pub avgpool: AvgPool2d,
    pub dropout: Dropout,
    pub fc: Linear<T>,

    num_classes: usize,
}

impl<T> Inception<T>
where
    T: Scalar,
{
    /// Create a swish-activated classifier.
    pub fn new(in_channels: usize, use_auxiliary: bool, num_classes: usize) -> Self {
        Self::with_activation(in_channels, use_auxiliary, num_classes, Swish)
    }
}

impl<T> Default for Inception<T>
where
    T: Scalar,
{
    /// The reference configuration: RGB input, auxiliary heads enabled,
    /// 33 classes.
    fn default() -> Self {
        Self::new(3, true, DEFAULT_NUM_CLASSES)
    }
}

impl<T, A> Inception<T, A>
where
    T: Scalar,
    A: Activation<T> + Clone,
{
    /// Create a classifier with a custom activation unit, shared by every
    /// block in the network.
    pub fn with_activation(
        in_channels: usize,
        use_auxiliary: bool,
        num_classes: usize,
        act: A,
    ) -> Self {
        let conv1 = ConvBlock::with_activation(in_channels, 64, 7, 2, 3, act.clone());
        let conv2 = ConvBlock::with_activation(64, 192, 3, 1, 1, act.clone());

        let inception3a =
            InceptionBlock::with_activation(192, 64, 96, 128, 16, 32, 32, act.clone());
        let inception3b =
            InceptionBlock::with_activation(384, 128, 128, 192, 32, 96, 64, act.clone());
        let inception4a =
            InceptionBlock::with_activation(672, 192, 96, 208, 16, 48, 64, act.clone());
        let inception4b =
            InceptionBlock::with_activation(992, 160, 112, 224, 24, 64, 64, act.clone());
        let inception4c =
            InceptionBlock::with_activation(1296, 128, 128, 256, 24, 64, 64, act.clone());
        let inception4d =
            InceptionBlock::with_activation(1584, 112, 144, 288, 32, 64, 64, act.clone());
        let inception4e =
            InceptionBlock::with_activation(1872, 256, 160, 320, 32, 128, 128, act.clone());
        let inception5a =
            InceptionBlock::with_activation(2320, 256, 160, 320, 32, 128, 128, act.clone());
        let inception5b =
            InceptionBlock::with_activation(2768, 384, 192, 384, 48, 128, 128, act.clone());

        let (aux1, aux2) = if use_auxiliary {
            (
                Some(Auxiliary::with_activation(
                    inception4a.out_channels(),
                    num_classes,
                    act.clone(),
                )),
                Some(Auxiliary::with_activation(
                    inception4d.out_channels(),
                    num_classes,
                    act.clone(),
                )),
            )
        } else {
            (None, None)
        };

        let fc = Linear::new(inception5b.out_channels(), num_classes, true);

        Self {
            conv1,
            conv2,
            inception3a,
            inception3b,
            inception4a,
            inception4b,
            inception4c,
            inception4d,
            inception4e,
            inception5a,
            inception5b,
            aux1,
            aux2,
            maxpool: MaxPool2d::new(3, 2, 1),
            avgpool: AvgPool2d::new(7, 1),
            dropout: Dropout::new(0.4),
            fc,
            num_classes,
        }
    }
}

impl<T, A> Inception<T, A>
where
    T: Scalar,
    A: Activation<T>,
{
    /// Number of classes the final linear layer predicts.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Whether the auxiliary heads were built.
    pub fn has_auxiliary(&self) -> bool {
        self.aux1.is_some()
    }

    /// Run the full network.
    ///
    /// Input must be `[batch, in_channels, 224, 224]`. Returns the main
    /// logits and, in training mode with auxiliary heads enabled, the two
    /// auxiliary logit tensors taken after stages 4a and 4d.
    pub fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<ForwardOutput<T>, String> {
        if input.ndim() != 4 {
            return Err(format!(
                "Inception requires 4D input [batch, channels, height, width], got shape {:?}",
                input.shape()
            ));
        }

        // Stem: 224 -> 112 -> 56 -> 28.
        let mut features = self.conv1.forward(input, mode)?;
        features = self.maxpool.forward(&features, mode)?;
        features = self.conv2.forward(&features, mode)?;
        features = self.maxpool.forward(&features, mode)?;

        features = self.inception3a.forward(&features, mode)?;
        features = self.inception3b.forward(&features, mode)?;
        // 28 -> 14.
        features = self.maxpool.forward(&features, mode)?;

        features = self.inception4a.forward(&features, mode)?;
        let aux1_logits = match (&self.aux1, mode) {
            (Some(aux), Mode::Train) => Some(aux.forward(&features, mode)?),
            _ => None,
        };

        features = self.inception4b.forward(&features, mode)?;
        features = self.inception4c.forward(&features, mode)?;
        features = self.inception4d.forward(&features, mode)?;
        let aux2_logits = match (&self.aux2, mode) {
            (Some(aux), Mode::Train) => Some(aux.forward(&features, mode)?),
            _ => None,
        };

        features = self.inception4e.forward(&features, mode)?;
        // 14 -> 7.
        features = self.maxpool.forward(&features, mode)?;

        features = self.inception5a.forward(&features, mode)?;
        features = self.inception5b.forward(&features, mode)?;

        // Head: 7x7 -> 1x1, flatten, dropout, classify.
        features = self.avgpool.forward(&features, mode)?;
        features = features.flatten_batch()?;
        features = self.dropout.forward(&features, mode)?;
        let logits = self.fc.forward(&features, mode)?;

        let auxiliary = match (aux1_logits, aux2_logits) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => None,
        };

        Ok(ForwardOutput { logits, auxiliary })
    }

    /// Collect every learnable parameter in the network, auxiliary heads
    /// included.
    pub fn parameters(&self) -> Vec<&Parameter<T>> {
        let mut params = self.conv1.parameters();
        params.extend(self.conv2.parameters());

        for stage in self.stages() {
            params.extend(stage.parameters());
        }
        if let Some(ref aux) = self.aux1 {
            params.extend(aux.parameters());
        }
        if let Some(ref aux) = self.aux2 {
            params.extend(aux.parameters());
        }
        params.extend(self.fc.parameters());
        params
    }

    /// Total number of learnable scalars.
    pub fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.size()).sum()
    }

    fn stages(&self) -> [&InceptionBlock<T, A>; 9] {
        [
            &self.inception3a,
            &self.inception3b,
            &self.inception4a,
            &self.inception4b,
            &self.inception4c,
            &self.inception4d,
            &self.inception4e,
            &self.inception5a,
            &self.inception5b,
        ]
    }
}
