// src/nn/layers/mod.rs
// Layer implementations used to assemble the network.

pub mod conv2d;
pub mod dropout;
pub mod linear;
pub mod norm;
pub mod pooling;

// Re-export commonly used layers for convenience
pub use conv2d::Conv2d;
pub use dropout::Dropout;
pub use linear::Linear;
pub use norm::BatchNorm2d;
pub use pooling::{AvgPool2d, MaxPool2d};
