// src/nn/layers/dropout.rs
// Inverted dropout: active in training mode, identity in evaluation mode.

use crate::nn::module::{Mode, Module};
use crate::tensor::{Scalar, Tensor};
use rand::Rng;

/// Dropout layer for regularization.
///
/// In [`Mode::Train`] every element is zeroed with probability `p` and the
/// survivors are scaled by `1 / (1 - p)`, so the expected activation is
/// unchanged and evaluation needs no rescaling. In [`Mode::Eval`] the
/// input passes through untouched.
#[derive(Debug, Clone, Copy)]
pub struct Dropout {
    /// Probability of zeroing an element, in `[0.0, 1.0]`.
    pub p: f64,
}

impl Dropout {
    /// Create a new Dropout layer with the given drop probability.
    pub fn new(p: f64) -> Self {
        if !(0.0..=1.0).contains(&p) {
            panic!("Dropout probability must be between 0.0 and 1.0, got {p}");
        }
        Self { p }
    }

    /// Build an inverted-dropout mask: each element is `1 / (1 - p)` with
    /// probability `1 - p` and zero otherwise.
    fn sample_mask<T: Scalar>(&self, shape: &[usize]) -> Result<Tensor<T>, String> {
        let total_elements: usize = shape.iter().product();
        let keep_prob = 1.0 - self.p;
        let scale = T::from_f64(1.0 / keep_prob).unwrap();

        let mut rng = rand::rng();
        let mut mask_data = Vec::with_capacity(total_elements);
        for _ in 0..total_elements {
            let sample: f64 = rng.random();
            if sample < keep_prob {
                mask_data.push(scale);
            } else {
                mask_data.push(T::zero());
            }
        }

        Tensor::from_vec(mask_data, shape)
    }
}

impl<T> Module<T> for Dropout
where
    T: Scalar,
{
    /// Forward pass: mask and rescale in training mode, identity otherwise.
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        if !mode.is_train() || self.p == 0.0 {
            return Ok(input.clone());
        }
        if self.p == 1.0 {
            return Ok(Tensor::zeros(input.shape()));
        }

        let mask = self.sample_mask(input.shape())?;
        input.mul(&mask)
    }
}
