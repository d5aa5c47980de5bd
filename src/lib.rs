//! convgrad: convolutional network layers with hand-written backpropagation.
//!
//! Implements the forward and backward passes of a small CNN toolkit from
//! first principles, with convolution and pooling expressed as matrix
//! products over im2col columns.
//!
//! # Features
//!
//! - Row-major `f64` tensors and a value/gradient [`tensors::Param`] wrapper.
//! - Layers: ReLU, fully-connected, convolutional, max-pooling and flatten.
//! - Softmax cross-entropy loss with its gradient, and L2 regularization.
//! - Finite-difference gradient checking for any layer or parameter.
//!
//! # Modules
//!
//! - [`tensors`]: Core tensor data structures and operations.
//! - [`ops`]: Parallel CPU kernels shared by the layers.
//! - [`im2col`]: Sliding-window unfolding and its adjoint.
//! - [`layers`]: The layer set and the [`layers::Layer`] trait.
//! - [`loss`]: Softmax, cross-entropy and L2 regularization.
//! - [`metrics`]: Accuracy and binary classification metrics.
//! - [`gradcheck`]: Numeric verification of analytic gradients.
//! - [`approx`]: Tolerance-based float comparison.
//! - [`error`]: The crate-wide error type.
//!
//! # Example
//!
//! ```rust
//! use convgrad::layers::{ConvolutionalLayer, Flattener, FullyConnectedLayer, Layer, MaxPoolingLayer, ReLULayer};
//! use convgrad::loss::softmax_with_cross_entropy;
//! use convgrad::tensors::Ten64;
//!
//! let mut net: Vec<Box<dyn Layer>> = vec![
//!     Box::new(ConvolutionalLayer::new(1, 2, 3, 1)),
//!     Box::new(ReLULayer::new()),
//!     Box::new(MaxPoolingLayer::new(2, 2)),
//!     Box::new(Flattener::new()),
//!     Box::new(FullyConnectedLayer::new(2 * 2 * 2, 3)),
//! ];
//!
//! let mut x = Ten64::zeros(vec![1, 4, 4, 1]);
//! x.data[5] = 1.0;
//! for layer in net.iter_mut() {
//!     x = layer.forward(&x)?;
//! }
//! let (_loss, mut grad) = softmax_with_cross_entropy(&x, &[2])?;
//! for layer in net.iter_mut().rev() {
//!     grad = layer.backward(&grad)?;
//! }
//! assert_eq!(grad.shape, vec![1, 4, 4, 1]);
//! # Ok::<(), convgrad::error::NetError>(())
//! ```

pub mod approx;
pub mod error;
pub mod gradcheck;
pub mod im2col;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod ops;
pub mod tensors;
