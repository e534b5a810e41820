// src/nn/layers/norm.rs
// Per-channel batch normalization with learned scale/shift and running
// statistics for evaluation mode.

use crate::nn::module::{Mode, Module};
use crate::nn::parameter::Parameter;
use crate::tensor::{Scalar, Tensor};
use ndarray::Axis;
use std::cell::RefCell;

/// Batch normalization over the channel dimension.
///
/// In [`Mode::Train`] the input is standardized with biased batch
/// statistics computed over the batch and spatial axes, and the running
/// statistics are updated with an exponential moving average. In
/// [`Mode::Eval`] the stored running statistics are used instead, making
/// evaluation deterministic. Both paths then apply the learned per-channel
/// scale (gamma) and shift (beta).
///
/// Accepts `[batch, channels, height, width]` or `[batch, features]` input;
/// the normalized dimension is always dimension 1.
///
/// Running statistics live behind `RefCell` so a forward pass can update
/// them without requiring `&mut self`; borrows never outlive a single call.
#[derive(Debug)]
pub struct BatchNorm2d<T>
where
    T: Scalar,
{
    /// Small epsilon for numerical stability.
    eps: f64,
    /// Momentum for running mean/var updates.
    momentum: f64,
    /// Learnable scale parameter (gamma), initialized to ones.
    pub weight: Parameter<T>,
    /// Learnable shift parameter (beta), initialized to zeros.
    pub bias: Parameter<T>,
    /// Running mean for evaluation mode (not learnable).
    pub running_mean: RefCell<Tensor<T>>,
    /// Running variance for evaluation mode (not learnable).
    pub running_var: RefCell<Tensor<T>>,
    /// Number of training batches seen.
    num_batches_tracked: RefCell<usize>,
    /// Size of the normalized dimension.
    num_features: usize,
}

impl<T> BatchNorm2d<T>
where
    T: Scalar,
{
    /// Create a BatchNorm layer with explicit epsilon and momentum.
    pub fn with_params(num_features: usize, eps: f64, momentum: f64) -> Self {
        let mut weight = Parameter::ones(&[num_features]);
        weight.set_name("weight".to_string());
        let mut bias = Parameter::zeros(&[num_features]);
        bias.set_name("bias".to_string());

        Self {
            eps,
            momentum,
            weight,
            bias,
            running_mean: RefCell::new(Tensor::zeros(&[num_features])),
            running_var: RefCell::new(Tensor::ones(&[num_features])),
            num_batches_tracked: RefCell::new(0),
            num_features,
        }
    }

    /// Create a BatchNorm layer with the standard eps = 1e-5, momentum = 0.1.
    pub fn new(num_features: usize) -> Self {
        Self::with_params(num_features, 1e-5, 0.1)
    }

    /// Get the epsilon value.
    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Get the momentum value.
    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    /// Get the number of training batches tracked so far.
    pub fn num_batches_tracked(&self) -> usize {
        *self.num_batches_tracked.borrow()
    }

    /// Snapshot of the running mean.
    pub fn get_running_mean(&self) -> Tensor<T> {
        self.running_mean.borrow().clone()
    }

    /// Snapshot of the running variance.
    pub fn get_running_var(&self) -> Tensor<T> {
        self.running_var.borrow().clone()
    }

    /// Reset running statistics to their initial state.
    pub fn reset_running_stats(&self) {
        *self.running_mean.borrow_mut() = Tensor::zeros(&[self.num_features]);
        *self.running_var.borrow_mut() = Tensor::ones(&[self.num_features]);
        *self.num_batches_tracked.borrow_mut() = 0;
    }

    /// Per-channel mean and biased variance over all non-channel axes.
    fn batch_stats(&self, input: &Tensor<T>) -> (Vec<T>, Vec<T>) {
        let mut means = Vec::with_capacity(self.num_features);
        let mut vars = Vec::with_capacity(self.num_features);

        for c in 0..self.num_features {
            let lane = input.data().index_axis(Axis(1), c);
            let count = T::from_usize(lane.len()).unwrap();

            let mut sum = T::zero();
            for &v in lane.iter() {
                sum = sum + v;
            }
            let mean = sum / count;

            let mut sq_sum = T::zero();
            for &v in lane.iter() {
                let d = v - mean;
                sq_sum = sq_sum + d * d;
            }
            means.push(mean);
            vars.push(sq_sum / count);
        }

        (means, vars)
    }

    /// Update running statistics with an exponential moving average:
    /// running = (1 - momentum) * running + momentum * batch.
    fn update_running_stats(&self, batch_mean: &[T], batch_var: &[T]) -> Result<(), String> {
        let momentum = T::from_f64(self.momentum).unwrap();
        let one_minus = T::one() - momentum;

        *self.num_batches_tracked.borrow_mut() += 1;

        {
            let mut running_mean = self.running_mean.borrow_mut();
            let batch = Tensor::from_vec(batch_mean.to_vec(), &[self.num_features])?;
            *running_mean = running_mean
                .mul_scalar(one_minus)
                .add(&batch.mul_scalar(momentum))?;
        }
        {
            let mut running_var = self.running_var.borrow_mut();
            let batch = Tensor::from_vec(batch_var.to_vec(), &[self.num_features])?;
            *running_var = running_var
                .mul_scalar(one_minus)
                .add(&batch.mul_scalar(momentum))?;
        }

        Ok(())
    }

    /// Standardize with the given per-channel statistics and apply the
    /// learned scale and shift.
    fn normalize(&self, input: &Tensor<T>, means: &[T], vars: &[T]) -> Result<Tensor<T>, String> {
        let eps = T::from_f64(self.eps).unwrap();
        let gamma_data = self.weight.data.data();
        let beta_data = self.bias.data.data();
        let gamma = gamma_data.as_slice().ok_or("Gamma not contiguous")?;
        let beta = beta_data.as_slice().ok_or("Beta not contiguous")?;

        let mut output = input.data().to_owned();
        for (c, mut lane) in output.axis_iter_mut(Axis(1)).enumerate() {
            let mean = means[c];
            let inv_std = T::one() / (vars[c] + eps).sqrt();
            let g = gamma[c];
            let b = beta[c];
            lane.mapv_inplace(|v| (v - mean) * inv_std * g + b);
        }

        Ok(Tensor::new(output))
    }
}

impl<T> Module<T> for BatchNorm2d<T>
where
    T: Scalar,
{
    /// Forward pass: standardize per channel, then scale and shift.
    fn forward(&self, input: &Tensor<T>, mode: Mode) -> Result<Tensor<T>, String> {
        if input.ndim() != 2 && input.ndim() != 4 {
            return Err(format!(
                "BatchNorm requires 2D or 4D input, got shape {:?}",
                input.shape()
            ));
        }
        if input.shape()[1] != self.num_features {
            return Err(format!(
                "Input features {} don't match layer features {}",
                input.shape()[1],
                self.num_features
            ));
        }

        if mode.is_train() {
            let (means, vars) = self.batch_stats(input);
            self.update_running_stats(&means, &vars)?;
            self.normalize(input, &means, &vars)
        } else {
            let running_mean = self.running_mean.borrow();
            let running_var = self.running_var.borrow();
            let means: Vec<T> = running_mean.data().iter().copied().collect();
            let vars: Vec<T> = running_var.data().iter().copied().collect();
            self.normalize(input, &means, &vars)
        }
    }

    fn parameters(&self) -> Vec<&Parameter<T>> {
        vec![&self.weight, &self.bias]
    }

    fn parameters_mut(&mut self) -> Vec<&mut Parameter<T>> {
        vec![&mut self.weight, &mut self.bias]
    }
}
