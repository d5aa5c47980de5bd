//! Parallel CPU tensor operations
//!
//! # CPU Kernels
//!
//! This module provides the CPU implementations of the dense operations used by
//! the layers' forward and backward passes.
//!
//! ## Features
//!
//! - Parallel execution using [`rayon`](https://docs.rs/rayon), one task per output row
//! - Pure Rust, no SIMD intrinsics
//!
//! ## Implemented Ops
//!
//! - `matmul`: `A·B`
//! - `matmul_tn`: `Aᵀ·B` (weight gradients of a dense layer)
//! - `matmul_nt`: `A·Bᵀ` (input gradients of a dense layer)
//! - `relu` / `relu_mask`: forward activation and its backward gate
//! - `sum_rows`: column-wise sum over the leading axis
//!
//! ## Design Goals
//!
//! - Deterministic results (each output row is produced by one task)
//! - Modular: kernels know nothing about layers or caching

use rayon::prelude::*;

use crate::tensors::{Ten64, Tensor};

fn dims2(t: &Ten64, what: &str) -> (usize, usize) {
    assert_eq!(t.rank(), 2, "{what} must be 2-D, got shape {:?}", t.shape);
    (t.shape[0], t.shape[1])
}

/// Performs a matrix multiplication `C = A × B` on two 2D tensors (`A: m×k`, `B: k×n`).
///
/// # Panics
/// - If either operand is not 2-D or the inner dimensions do not match.
///
/// # Example
/// ```rust
/// use convgrad::{ops::cpu::matmul, tensor};
///
/// let a = tensor!([[1.0, 2.0], [3.0, 4.0]]);
/// let b = tensor!([[5.0, 6.0], [7.0, 8.0]]);
/// let c = matmul(&a, &b);
/// assert_eq!(c.data, vec![19.0, 22.0, 43.0, 50.0]);
/// ```
pub fn matmul(a: &Ten64, b: &Ten64) -> Ten64 {
    let (m, k) = dims2(a, "lhs");
    let (k2, n) = dims2(b, "rhs");
    assert_eq!(k, k2, "matmul shape mismatch");

    let a_data = &a.data;
    let b_data = &b.data;
    let mut out_data = vec![0.0; m * n];

    if n > 0 {
        out_data
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| {
                for l in 0..k {
                    let a_il = a_data[i * k + l];
                    let b_row = &b_data[l * n..(l + 1) * n];
                    for (c, &b_lj) in row.iter_mut().zip(b_row) {
                        *c += a_il * b_lj;
                    }
                }
            });
    }

    Tensor::new(vec![m, n], out_data)
}

/// Computes `Aᵀ × B` for `A: k×m`, `B: k×n` without materializing the transpose.
///
/// # Panics
/// - If either operand is not 2-D or the leading dimensions do not match.
pub fn matmul_tn(a: &Ten64, b: &Ten64) -> Ten64 {
    let (k, m) = dims2(a, "lhs");
    let (k2, n) = dims2(b, "rhs");
    assert_eq!(k, k2, "matmul_tn shape mismatch");

    let a_data = &a.data;
    let b_data = &b.data;
    let mut out_data = vec![0.0; m * n];

    if n > 0 {
        out_data
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| {
                for l in 0..k {
                    let a_li = a_data[l * m + i];
                    let b_row = &b_data[l * n..(l + 1) * n];
                    for (c, &b_lj) in row.iter_mut().zip(b_row) {
                        *c += a_li * b_lj;
                    }
                }
            });
    }

    Tensor::new(vec![m, n], out_data)
}

/// Computes `A × Bᵀ` for `A: m×k`, `B: n×k` without materializing the transpose.
///
/// # Panics
/// - If either operand is not 2-D or the trailing dimensions do not match.
pub fn matmul_nt(a: &Ten64, b: &Ten64) -> Ten64 {
    let (m, k) = dims2(a, "lhs");
    let (n, k2) = dims2(b, "rhs");
    assert_eq!(k, k2, "matmul_nt shape mismatch");

    let a_data = &a.data;
    let b_data = &b.data;
    let mut out_data = vec![0.0; m * n];

    if n > 0 {
        out_data
            .par_chunks_mut(n)
            .enumerate()
            .for_each(|(i, row)| {
                let a_row = &a_data[i * k..(i + 1) * k];
                for (j, c) in row.iter_mut().enumerate() {
                    let b_row = &b_data[j * k..(j + 1) * k];
                    *c = a_row.iter().zip(b_row).map(|(x, y)| x * y).sum();
                }
            });
    }

    Tensor::new(vec![m, n], out_data)
}

/// Applies the ReLU activation function element-wise: `max(0, x)`.
pub fn relu(input: &Ten64) -> Ten64 {
    let mut data = vec![0.0f64; input.len()];
    data.par_iter_mut()
        .zip(input.data.par_iter())
        .for_each(|(y, &x)| {
            *y = if x > 0.0 { x } else { 0.0 };
        });
    Tensor::new(input.shape.clone(), data)
}

/// Gates `grad_output` by the sign of `input`: passes gradient only where `input > 0`.
///
/// # Panics
/// Panics if the two tensors have different shapes.
pub fn relu_mask(input: &Ten64, grad_output: &Ten64) -> Ten64 {
    assert_eq!(input.shape, grad_output.shape, "relu_mask shape mismatch");
    let mut grad = vec![0.0f64; grad_output.len()];
    grad.par_iter_mut()
        .zip(input.data.par_iter())
        .zip(grad_output.data.par_iter())
        .for_each(|((g, &x), &dy)| {
            *g = if x > 0.0 { dy } else { 0.0 };
        });
    Tensor::new(input.shape.clone(), grad)
}

/// Sums a `rows × cols` matrix over its rows, returning shape `[1, cols]`.
///
/// # Panics
/// Panics if `t` is not 2-D.
pub fn sum_rows(t: &Ten64) -> Ten64 {
    let (rows, cols) = dims2(t, "input");
    let mut out = vec![0.0; cols];
    for r in 0..rows {
        for (o, &x) in out.iter_mut().zip(&t.data[r * cols..(r + 1) * cols]) {
            *o += x;
        }
    }
    Tensor::new(vec![1, cols], out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor;

    #[test]
    fn transposed_products_agree_with_explicit_transpose() {
        let a = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let b = tensor!([[7.0, 8.0], [9.0, 10.0]]);

        let tn = matmul_tn(&a, &b);
        assert_eq!(tn, matmul(&a.permute(&[1, 0]), &b));

        let c = tensor!([[1.0, 0.0, 2.0], [0.5, 1.0, -1.0]]);
        let nt = matmul_nt(&a, &c);
        assert_eq!(nt, matmul(&a, &c.permute(&[1, 0])));
    }

    #[test]
    #[should_panic(expected = "matmul shape mismatch")]
    fn matmul_panics_on_invalid_shape() {
        let a = tensor!([[1.0, 2.0]]);
        let b = tensor!([[1.0, 2.0]]);
        let _ = matmul(&a, &b);
    }

    #[test]
    fn sum_rows_collapses_leading_axis() {
        let t = tensor!([[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]]);
        let s = sum_rows(&t);
        assert_eq!(s.shape, vec![1, 2]);
        assert_eq!(s.data, vec![9.0, 12.0]);
    }

    #[test]
    fn relu_mask_uses_strict_positivity() {
        let x = tensor!([-1.0, 0.0, 2.0]);
        let dy = tensor!([5.0, 5.0, 5.0]);
        assert_eq!(relu(&x).data, vec![0.0, 0.0, 2.0]);
        assert_eq!(relu_mask(&x, &dy).data, vec![0.0, 0.0, 5.0]);
    }
}
