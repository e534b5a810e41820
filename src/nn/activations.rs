// src/nn/activations.rs
// Elementwise nonlinearities. The architecture uses swish everywhere; the
// trait keeps the activation pluggable for any component with the same
// shape-preserving contract.

use crate::tensor::{Scalar, Tensor};

/// An elementwise nonlinear transform applied after linear operations.
///
/// Implementations must preserve the input shape. Any type with this
/// capability can be substituted into the convolutional blocks.
pub trait Activation<T>: std::fmt::Debug
where
    T: Scalar,
{
    /// Apply the nonlinearity elementwise.
    fn apply(&self, input: &Tensor<T>) -> Tensor<T>;
}

/// Swish activation: f(x) = x * sigmoid(x).
///
/// A smooth, non-monotonic alternative to ReLU; the default activation of
/// every convolutional block and auxiliary head in the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct Swish;

impl<T> Activation<T> for Swish
where
    T: Scalar,
{
    fn apply(&self, input: &Tensor<T>) -> Tensor<T> {
        input.map(|v| v / (T::one() + (-v).exp()))
    }
}

/// ReLU activation: f(x) = max(0, x).
#[derive(Debug, Clone, Copy, Default)]
pub struct ReLU;

impl<T> Activation<T> for ReLU
where
    T: Scalar,
{
    fn apply(&self, input: &Tensor<T>) -> Tensor<T> {
        input.map(|v| if v > T::zero() { v } else { T::zero() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn swish_known_values() {
        let input = Tensor::<f64>::from_vec(vec![-1.0, 0.0, 1.0], &[3]).unwrap();
        let output = Swish.apply(&input);

        // x * sigmoid(x)
        assert_relative_eq!(output.data()[[0]], -0.2689414213699951, epsilon = 1e-12);
        assert_relative_eq!(output.data()[[1]], 0.0, epsilon = 1e-12);
        assert_relative_eq!(output.data()[[2]], 0.7310585786300049, epsilon = 1e-12);
    }

    #[test]
    fn relu_clamps_negatives() {
        let input = Tensor::<f32>::from_vec(vec![-2.0, -0.5, 0.0, 0.5, 2.0], &[5]).unwrap();
        let output = ReLU.apply(&input);
        let expected = [0.0, 0.0, 0.0, 0.5, 2.0];
        for (got, want) in output.data().iter().zip(expected) {
            assert_relative_eq!(*got, want);
        }
    }

    #[test]
    fn activations_preserve_shape() {
        let input = Tensor::<f32>::ones(&[2, 3, 4, 4]);
        assert_eq!(Swish.apply(&input).shape(), input.shape());
        assert_eq!(ReLU.apply(&input).shape(), input.shape());
    }
}
