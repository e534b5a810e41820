// Neural network building blocks: the module trait, parameters,
// activations and the layers the classifier is assembled from.

pub mod activations;
pub mod layers;
pub mod module;
pub mod parameter;
mod tests;

// Re-export the main types and traits for convenience
pub use activations::{Activation, ReLU, Swish};
pub use layers::{AvgPool2d, BatchNorm2d, Conv2d, Dropout, Linear, MaxPool2d};
pub use module::{Mode, Module};
pub use parameter::Parameter;

/// Weight initialization utilities
pub mod init {
    pub use crate::initializers::*;
}
