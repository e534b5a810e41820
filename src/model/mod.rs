// The classifier itself: building blocks and the assembled network.

pub mod blocks;
pub mod inception;

pub use blocks::{Auxiliary, ConvBlock, DenseBlock, InceptionBlock, DENSE_GROWTH};
pub use inception::{ForwardOutput, Inception, DEFAULT_NUM_CLASSES};
