//! Core tensor data structures and operations.
//!
//! # Core Tensor Utilities
//!
//! This module defines the representation of multi-dimensional arrays used by
//! every layer, together with the parameter wrapper that carries a gradient.
//!
//! It supports:
//! - Construction of N-dimensional tensors with shape and row-major data layout
//! - Validated construction from untrusted shape/data pairs
//! - Reshaping and arbitrary axis permutation
//! - `WithGrad<T>` / [`Param`] pairing a value with its gradient accumulator
//! - The `tensor!` macro for literal tensors
//!
//! ## Design Highlights
//! - Tensors are strongly typed: `Tensor<T>` for any element type, [`Ten64`] for `f64`
//! - Shape is stored as a `Vec<usize>` and enforced at runtime
//! - Layer activations use `(batch, height, width, channels)`; the im2col kernels
//!   use `(batch, channels, height, width)`, and [`Tensor::permute`] moves between them
//!
//! ## Limitations
//! - Row-major only
//! - No broadcasting or slicing
//!
//! ## Example
//!
//! ```rust
//! use convgrad::tensors::Tensor;
//! let t = Tensor::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
//! assert_eq!(t.shape, vec![2, 3]);
//! ```

use briny::prelude::*;

use crate::error::NetError;

/// Represents an N-dimensional tensor with a shape and flat row-major data.
///
/// - All elements must be the same type (`T`).
/// - `shape` defines the structure, e.g., `[2, 3]` for a 2×3 matrix.
/// - `data` holds the flattened content in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T> {
    pub shape: Vec<usize>,
    pub data: Vec<T>,
}

/// The tensor type every layer works with.
pub type Ten64 = Tensor<f64>;

/// Untrusted shape/data pair awaiting validation.
struct RawTensor<T> {
    shape: Vec<usize>,
    data: Vec<T>,
}

impl<T> Validate for RawTensor<T> {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.shape.iter().product::<usize>() != self.data.len() {
            return Err(ValidationError);
        }
        Ok(())
    }
}

impl<T> Tensor<T> {
    /// Creates a new tensor with the given shape and flat data.
    ///
    /// # Panics
    /// Panics if the number of elements in `data` does not match the shape product.
    pub fn new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Self {
        let shape = shape.into();
        assert_eq!(
            shape.iter().product::<usize>(),
            data.len(),
            "shape {:?} is incompatible with {} data elements",
            shape,
            data.len()
        );
        Self { shape, data }
    }

    /// Creates a tensor from an untrusted shape/data pair.
    ///
    /// # Errors
    /// Returns [`NetError::InvalidTensor`] if the element count does not match the shape.
    pub fn try_new(shape: impl Into<Vec<usize>>, data: Vec<T>) -> Result<Self, NetError> {
        let raw = RawTensor {
            shape: shape.into(),
            data,
        };
        let (shape, len) = (raw.shape.clone(), raw.data.len());
        let trusted = TrustedData::new(raw).map_err(|_| NetError::InvalidTensor { shape, len })?;
        let inner = trusted.into_inner();
        Ok(Self {
            shape: inner.shape,
            data: inner.data,
        })
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Total number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the same data viewed under a new shape.
    ///
    /// # Errors
    /// Returns [`NetError::InvalidTensor`] if the new shape holds a different number of elements.
    pub fn reshape(self, shape: impl Into<Vec<usize>>) -> Result<Self, NetError> {
        Self::try_new(shape, self.data)
    }

    /// Replaces this tensor's data with another tensor of the same shape.
    ///
    /// # Panics
    /// Panics if shapes do not match.
    pub fn update(&mut self, mut other: Tensor<T>) {
        assert_eq!(self.shape, other.shape, "shape mismatch");
        std::mem::swap(&mut self.data, &mut other.data);
    }
}

impl<T: Copy> Tensor<T> {
    /// Reorders the axes: output axis `i` is input axis `axes[i]`.
    ///
    /// # Panics
    /// Panics if `axes` is not a permutation of `0..rank`.
    ///
    /// # Example
    /// ```rust
    /// use convgrad::tensors::Tensor;
    /// let t = Tensor::new(vec![2, 3], vec![1, 2, 3, 4, 5, 6]);
    /// let tt = t.permute(&[1, 0]);
    /// assert_eq!(tt.shape, vec![3, 2]);
    /// assert_eq!(tt.data, vec![1, 4, 2, 5, 3, 6]);
    /// ```
    pub fn permute(&self, axes: &[usize]) -> Self {
        let rank = self.rank();
        assert_eq!(axes.len(), rank, "permutation rank mismatch");
        let mut seen = vec![false; rank];
        for &a in axes {
            assert!(a < rank && !seen[a], "invalid permutation {axes:?}");
            seen[a] = true;
        }

        let in_strides = strides(&self.shape);
        let out_shape: Vec<usize> = axes.iter().map(|&a| self.shape[a]).collect();
        // stride in the source for each output axis
        let src_strides: Vec<usize> = axes.iter().map(|&a| in_strides[a]).collect();

        let mut data = Vec::with_capacity(self.data.len());
        let mut idx = vec![0usize; rank];
        for _ in 0..self.data.len() {
            let offset: usize = idx.iter().zip(&src_strides).map(|(i, s)| i * s).sum();
            data.push(self.data[offset]);
            for d in (0..rank).rev() {
                idx[d] += 1;
                if idx[d] < out_shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }

        Tensor::new(out_shape, data)
    }

    /// Applies `f` to every element.
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Tensor<U> {
        Tensor::new(self.shape.clone(), self.data.iter().map(|&x| f(x)).collect())
    }
}

impl Ten64 {
    /// A tensor of zeros.
    pub fn zeros(shape: impl Into<Vec<usize>>) -> Self {
        let shape = shape.into();
        let len = shape.iter().product();
        Self::new(shape, vec![0.0; len])
    }

    /// A tensor of the same shape as `self`, filled with zeros.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(self.shape.clone())
    }

    /// A tensor of the same shape as `self`, filled with ones.
    pub fn ones_like(&self) -> Self {
        Self::new(self.shape.clone(), vec![1.0; self.len()])
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Element-wise product with a tensor of the same shape.
    ///
    /// # Panics
    /// Panics if shapes do not match.
    pub fn hadamard(&self, other: &Ten64) -> Ten64 {
        assert_eq!(self.shape, other.shape, "shape mismatch");
        Tensor::new(
            self.shape.clone(),
            self.data.iter().zip(&other.data).map(|(a, b)| a * b).collect(),
        )
    }

    /// Adds `other` into `self` element-wise.
    ///
    /// # Panics
    /// Panics if shapes do not match.
    pub fn accumulate(&mut self, other: &Ten64) {
        assert_eq!(self.shape, other.shape, "shape mismatch");
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
    }
}

/// Row-major strides for `shape`.
fn strides(shape: &[usize]) -> Vec<usize> {
    let mut out = vec![1usize; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        out[d] = out[d + 1] * shape[d + 1];
    }
    out
}

/// A value paired with its gradient accumulator.
///
/// Typically used as `WithGrad<Ten64>`, aliased as [`Param`].
#[derive(Debug, Clone, PartialEq)]
pub struct WithGrad<T> {
    pub value: T,
    pub grad: T,
}

/// Trainable parameter of a layer.
///
/// Gradients accumulate additively across `backward` calls; nothing in this
/// crate resets them except [`WithGrad::zero_grad`].
pub type Param = WithGrad<Ten64>;

impl WithGrad<Ten64> {
    /// Wraps `value` with a zeroed gradient of the same shape.
    pub fn new(value: Ten64) -> Self {
        let grad = value.zeros_like();
        Self { value, grad }
    }

    /// Resets the gradient accumulator to zero.
    pub fn zero_grad(&mut self) {
        self.grad.data.iter_mut().for_each(|g| *g = 0.0);
    }
}

/// Defines a tensor from nested literal arrays.
///
/// Supports arbitrary dimensionality as long as sublists are uniform in shape.
///
/// # Example
/// ```
/// use convgrad::tensor;
/// let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// assert_eq!(t.shape, vec![2, 2]);
/// ```
#[macro_export]
macro_rules! tensor {
    ([ $( [ $($row:tt)* ] ),+ $(,)? ]) => {{
        let children = vec![ $( $crate::tensor!([ $($row)* ]) ),+ ];
        let first_shape = &children[0].shape;
        assert!(children.iter().all(|c| c.shape == *first_shape),
            "ragged tensor literal (rows have mismatched shapes)");
        let mut shape = vec![children.len()];
        shape.extend_from_slice(first_shape);
        let mut data = Vec::with_capacity(children.len() * children[0].data.len());
        for c in children { data.extend(c.data); }
        $crate::tensors::Tensor::new(shape, data)
    }};

    // innermost axis; elements are expressions so negative literals work
    ([ $( $x:expr ),+ $(,)? ]) => {{
        let data = vec![ $( $x ),+ ];
        $crate::tensors::Tensor::new(vec![data.len()], data)
    }};

    ($x:expr) => {
        $crate::tensors::Tensor::new(Vec::<usize>::new(), vec![$x])
    };
}
