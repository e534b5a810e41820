// src/lib.rs
//! Inception-style image classifier with dense-growth branches and swish
//! activations, built on [`ndarray`].
//!
//! The crate is a forward-pass implementation: [`model::Inception`] wires
//! the stem, nine inception stages, two auxiliary heads and the linear
//! classifier together, with every mode-dependent layer (batch norm,
//! dropout, the auxiliary gates) switched explicitly through
//! [`nn::Mode`].
//!
//! ```rust
//! use swishnet::model::InceptionBlock;
//! use swishnet::{Mode, Module, Tensor};
//!
//! // Stage 3a: 192 input channels widen to 64 + 96 + 192 + 32 = 384.
//! let block = InceptionBlock::<f32>::new(192, 64, 96, 128, 16, 32, 32);
//! let input = Tensor::ones(&[1, 192, 7, 7]);
//! let output = block.forward(&input, Mode::Eval)?;
//! assert_eq!(output.shape(), &[1, 384, 7, 7]);
//! # Ok::<(), String>(())
//! ```

pub mod initializers;
pub mod model;
pub mod nn;
pub mod tensor;

pub use model::{ForwardOutput, Inception};
pub use nn::{Mode, Module};
pub use tensor::{Scalar, Tensor};
