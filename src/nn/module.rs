// src/nn/module.rs
// The base trait every network component implements, plus the explicit
// train/eval mode switch threaded through forward calls.

use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};

/// Whether a forward pass runs with training or evaluation semantics.
///
/// The mode is an explicit per-call argument rather than mutable state on
/// the layers: batch normalization picks between batch and running
/// statistics with it, dropout is active only in [`Mode::Train`], and the
/// network runs its auxiliary classifiers only in [`Mode::Train`]. Callers
/// must not change intent mid-pass; since `Mode` is `Copy` and passed by
/// value, every component of a single pass sees the same mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

impl Mode {
    /// True when running with training semantics.
    pub fn is_train(self) -> bool {
        matches!(self, Mode::Train)
    }
}

/// The base trait for all neural network modules.
///
/// A module is an immutable (post-construction) computation node: it owns
/// its parameters and maps an input tensor to an output tensor. Composite
/// modules hold their children as plain struct fields and call them in a
/// fixed order, so the module graph is a statically declared tree.
///
/// # Examples
///
/// ```rust
/// use swishnet::nn::{Mode, Module, Parameter};
/// use swishnet::tensor::Tensor;
///
/// struct Scale {
///     factor: Parameter<f64>,
/// }
///
/// impl Module<f64> for Scale {
///     fn forward(&self, input: &Tensor<f64>, _mode: Mode) -> Result<Tensor<f64>, String> {
///         let s = self.factor.data.data()[[0]];
///         Ok(input.mul_scalar(s))
///     }
///
///     fn parameters(&self) -> Vec<&Parameter<f64>> {
///         vec![&self.factor]
///     }
///
///     fn parameters_mut(&mut self) -> Vec<&mut Parameter<f64>> {
///         vec![&mut self.factor]
///     }
/// }
///
/// let scale = Scale { factor: Parameter::new(Tensor::full(&[1], 2.0)) };
/// let out = scale.forward(&Tensor::ones(&[3]), Mode::Eval).unwrap();
/// assert_eq!(out.data()[[0]], 2.0);
/// ```
pub trait Module<T>
where
    T: Scalar,
{
    /// Performs the forward pass of the module.
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String>;

    /// Returns all parameters of this module.
    ///
    /// Composite modules collect recursively from their children. The
    /// default is empty for parameter-free modules like pooling.
    fn parameters(&self) -> Vec<&Parameter<T>> {
        Vec::new()
    }

    /// Returns mutable references to all parameters of this module.
    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        Vec::new()
    }

    /// Returns the number of scalar parameters in this module,
    /// including all submodules.
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(|p| p.size()).sum()
    }
}
