//! Network layers with hand-written backward passes.
//!
//! Every layer implements [`Layer`]. A layer remembers what its backward pass
//! needs from the most recent `forward` call and gives it up on the next
//! `backward`; calling `backward` with nothing pending is an error.
//!
//! Parameter gradients accumulate across `backward` calls. Reset them with
//! [`Layer::zero_grad`] before each optimization step.
//!
//! # Example
//! ```rust
//! use convgrad::layers::{Layer, ReLULayer};
//! use convgrad::tensor;
//!
//! let mut relu = ReLULayer::new();
//! let out = relu.forward(&tensor!([[-1.0, 2.0]])).unwrap();
//! let grad = relu.backward(&out.ones_like()).unwrap();
//! assert_eq!(grad.data, vec![0.0, 1.0]);
//! ```

mod conv;
pub use self::conv::ConvolutionalLayer;

mod dense;
pub use self::dense::FullyConnectedLayer;

mod flatten;
pub use self::flatten::Flattener;

mod pool;
pub use self::pool::MaxPoolingLayer;

mod relu;
pub use self::relu::ReLULayer;

use crate::error::NetError;
use crate::tensors::{Param, Ten64};

/// An abstraction over the operations every layer provides.
pub trait Layer {
    /// Computes the layer output and remembers what `backward` needs.
    ///
    /// # Errors
    /// Returns an error if `input` has the wrong rank or shape for this layer.
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError>;

    /// Propagates `grad_output` (`dL/d(output)`) to `dL/d(input)`, adding
    /// parameter gradients into each [`Param::grad`].
    ///
    /// # Errors
    /// - [`NetError::MissingForward`] if no forward call is pending
    /// - [`NetError::ShapeMismatch`] if `grad_output` is not shaped like the last output
    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError>;

    /// Immutably obtains the named trainable parameters.
    fn params(&self) -> Vec<(&'static str, &Param)> {
        Vec::new()
    }

    /// Mutably obtains the named trainable parameters.
    fn params_mut(&mut self) -> Vec<(&'static str, &mut Param)> {
        Vec::new()
    }

    /// Looks up a parameter by name.
    ///
    /// # Errors
    /// [`NetError::UnknownParam`] if the layer has no such parameter.
    fn param_mut(&mut self, name: &str) -> Result<&mut Param, NetError> {
        self.params_mut()
            .into_iter()
            .find(|(n, _)| *n == name)
            .map(|(_, p)| p)
            .ok_or_else(|| NetError::UnknownParam {
                name: name.to_owned(),
            })
    }

    /// Zeroes the gradients of the weights.
    fn zero_grad(&mut self) {
        for (_, p) in self.params_mut() {
            p.zero_grad();
        }
    }
}

/// Fails unless `t` has exactly `rank` axes.
pub(crate) fn expect_rank(op: &'static str, t: &Ten64, rank: usize) -> Result<(), NetError> {
    if t.rank() != rank {
        return Err(NetError::RankMismatch {
            op,
            expected: rank,
            actual: t.shape.clone(),
        });
    }
    Ok(())
}

/// Fails unless `actual` equals `expected`.
pub(crate) fn expect_shape(
    op: &'static str,
    expected: &[usize],
    actual: &[usize],
) -> Result<(), NetError> {
    if expected != actual {
        return Err(NetError::ShapeMismatch {
            op,
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        });
    }
    Ok(())
}
