// src/nn/parameter.rs
// Learnable tensor wrapper used by every layer with weights.

use crate::tensor::{Scalar, Tensor};

/// A Parameter is a tensor that represents learnable state in the network.
///
/// Parameters are what [`crate::nn::Module::parameters`] collects; the
/// optional name exists for debugging and inspection.
///
/// # Examples
///
/// ```rust
/// use swishnet::nn::Parameter;
/// use swishnet::tensor::Tensor;
///
/// let weight = Parameter::new(Tensor::<f32>::zeros(&[64, 3, 7, 7]));
/// assert_eq!(weight.size(), 64 * 3 * 7 * 7);
/// ```
#[derive(Debug, Clone)]
pub struct Parameter<T>
where
    T: Scalar,
{
    /// The actual tensor data.
    pub data: Tensor<T>,
    /// Optional name for debugging.
    pub name: Option<String>,
}

impl<T> Parameter<T>
where
    T: Scalar,
{
    /// Creates a new parameter from tensor data.
    pub fn new(data: Tensor<T>) -> Self {
        Self { data, name: None }
    }

    /// Creates a new named parameter.
    pub fn new_named(data: Tensor<T>, name: String) -> Self {
        Self {
            data,
            name: Some(name),
        }
    }

    /// Creates a parameter by sampling every element from an
    /// initialization closure (see [`crate::nn::init`]).
    pub fn from_init<F>(shape: &[usize], mut init_fn: F) -> Self
    where
        F: FnMut() -> f64,
    {
        let total_elements: usize = shape.iter().product();
        let data: Vec<T> = (0..total_elements)
            .map(|_| T::from_f64(init_fn()).unwrap())
            .collect();

        let tensor = Tensor::from_vec(data, shape).expect("Failed to create parameter tensor");
        Self::new(tensor)
    }

    /// Creates a zero-filled parameter.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(Tensor::zeros(shape))
    }

    /// Creates a one-filled parameter.
    pub fn ones(shape: &[usize]) -> Self {
        Self::new(Tensor::ones(shape))
    }

    /// Returns the shape of the parameter.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Returns the number of elements in the parameter.
    pub fn size(&self) -> usize {
        self.data.size()
    }

    /// Gets the parameter name if available.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the parameter name.
    pub fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

impl<T> From<Tensor<T>> for Parameter<T>
where
    T: Scalar,
{
    fn from(tensor: Tensor<T>) -> Self {
        Self::new(tensor)
    }
}
