// src/nn/layers/linear.rs
// Fully-connected layer used by the classifier heads.

use crate::initializers::xavier_uniform;
use crate::nn::module::{Mode, Module};
use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};

/// Linear transformation layer: y = x @ W^T + b.
/// Weight matrix is stored as `[out_features, in_features]`.
#[derive(Debug, Clone)]
pub struct Linear<T>
where
    T: Scalar,
{
    /// Weight matrix `[out_features, in_features]`.
    pub weight: Parameter<T>,
    /// Optional bias vector `[out_features]`.
    pub bias: Option<Parameter<T>>,
    /// Number of input features.
    pub in_features: usize,
    /// Number of output features.
    pub out_features: usize,
}

impl<T> Linear<T>
where
    T: Scalar,
{
    /// Create a new linear layer with Xavier-uniform weights and,
    /// optionally, a zero-initialized bias.
    pub fn new(in_features: usize, out_features: usize, bias: bool) -> Self {
        let mut weight = Parameter::from_init(
            &[out_features, in_features],
            xavier_uniform(in_features, out_features, 1.0),
        );
        weight.set_name("weight".to_string());

        let bias_param = if bias {
            let mut b = Parameter::zeros(&[out_features]);
            b.set_name("bias".to_string());
            Some(b)
        } else {
            None
        };

        Self {
            weight,
            bias: bias_param,
            in_features,
            out_features,
        }
    }

    /// Check if the layer has a bias.
    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }
}

impl<T> Module<T> for Linear<T>
where
    T: Scalar,
{
    /// Forward pass: y = x @ W^T + b.
    /// Input shape `[batch, in_features]`, output shape `[batch, out_features]`.
    fn forward(&self, input: &Tensor<T>, _mode: Mode) -> Result<Tensor<T>, String> {
        if input.ndim() != 2 || input.shape()[1] != self.in_features {
            return Err(format!(
                "Linear expects input [batch, {}], got shape {:?}",
                self.in_features,
                input.shape()
            ));
        }

        let weight_t = self.weight.data.transpose2d()?;
        let output = input.matmul(&weight_t)?;

        match self.bias {
            Some(ref bias) => {
                // [batch, out] + [out] broadcasts over the batch dimension.
                Ok(Tensor::new(output.data() + bias.data.data()))
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
