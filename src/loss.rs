//! Classification loss and weight regularization.
//!
//! Pure functions: nothing here keeps state between calls.
//!
//! Predictions are either a single unbatched score vector of shape `(N,)`,
//! paired with exactly one target index, or a batch of shape
//! `(batch_size, N)` paired with one target index per row. Batched losses and
//! gradients are averaged over the batch.

use crate::error::NetError;
use crate::tensors::{Ten64, Tensor};

/// Computes L2 regularization loss on weights and its gradient.
///
/// - `loss = reg_strength · Σ W²`
/// - `grad = 2 · reg_strength · W`
///
/// # Example
/// ```rust
/// use convgrad::{loss::l2_regularization, tensor};
///
/// let (loss, grad) = l2_regularization(&tensor!([1.0, -2.0]), 0.5);
/// assert_eq!(loss, 2.5);
/// assert_eq!(grad.data, vec![1.0, -2.0]);
/// ```
pub fn l2_regularization(weights: &Ten64, reg_strength: f64) -> (f64, Ten64) {
    let loss = reg_strength * weights.data.iter().map(|w| w * w).sum::<f64>();
    let grad = weights.map(|w| 2.0 * reg_strength * w);
    (loss, grad)
}

/// Splits `t` into `(rows, classes)`, treating a vector as a single row.
fn rows(op: &'static str, t: &Ten64) -> Result<(usize, usize), NetError> {
    match t.shape.as_slice() {
        &[n] => Ok((1, n)),
        &[batch, n] => Ok((batch, n)),
        _ => Err(NetError::RankMismatch {
            op,
            expected: 2,
            actual: t.shape.clone(),
        }),
    }
}

fn check_targets(
    op: &'static str,
    t: &Ten64,
    target_index: &[usize],
) -> Result<(usize, usize), NetError> {
    let (batch, classes) = rows(op, t)?;
    if batch == 0 {
        return Err(NetError::EmptyInput { op });
    }
    if target_index.len() != batch {
        return Err(NetError::ShapeMismatch {
            op,
            expected: vec![batch],
            actual: vec![target_index.len()],
        });
    }
    if let Some(&index) = target_index.iter().find(|&&i| i >= classes) {
        return Err(NetError::TargetOutOfRange { index, classes });
    }
    Ok((batch, classes))
}

/// Computes probabilities from scores.
///
/// Subtracts each row's maximum before exponentiating, so large scores do not
/// overflow. A 1-D input is normalized as a whole; a 2-D input row by row.
///
/// # Errors
/// [`NetError::RankMismatch`] for inputs that are neither 1-D nor 2-D.
pub fn softmax(predictions: &Ten64) -> Result<Ten64, NetError> {
    let (_, classes) = rows("softmax", predictions)?;
    let mut out = predictions.data.clone();

    if classes > 0 {
        for row in out.chunks_mut(classes) {
            let max_val = row.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            row.iter_mut().for_each(|x| *x = (*x - max_val).exp());
            let exp_sum: f64 = row.iter().sum();
            row.iter_mut().for_each(|x| *x /= exp_sum);
        }
    }

    Ok(Tensor::new(predictions.shape.clone(), out))
}

/// Computes the cross-entropy loss `-log p[target]`, averaged over the batch.
///
/// # Errors
/// - [`NetError::RankMismatch`] for inputs that are neither 1-D nor 2-D
/// - [`NetError::ShapeMismatch`] if there is not one target per row
/// - [`NetError::TargetOutOfRange`] if a target is not a valid class
pub fn cross_entropy_loss(probs: &Ten64, target_index: &[usize]) -> Result<f64, NetError> {
    let (batch, classes) = check_targets("cross_entropy_loss", probs, target_index)?;
    let total: f64 = target_index
        .iter()
        .enumerate()
        .map(|(row, &t)| -probs.data[row * classes + t].ln())
        .sum();
    Ok(total / batch as f64)
}

/// Computes softmax and cross-entropy loss for model predictions, including
/// the gradient `softmax(predictions) - one_hot(target_index)`.
///
/// The gradient has the same shape as `predictions`; for a batch it is
/// divided by the batch size to match the averaged loss.
///
/// # Errors
/// Same as [`cross_entropy_loss`].
///
/// # Example
/// ```rust
/// use convgrad::{loss::softmax_with_cross_entropy, tensor};
///
/// let (loss, grad) = softmax_with_cross_entropy(&tensor!([[1.0, 0.0, 0.0]]), &[0]).unwrap();
/// assert!(loss > 0.0);
/// assert!(grad.data.iter().sum::<f64>().abs() < 1e-12);
/// ```
pub fn softmax_with_cross_entropy(
    predictions: &Ten64,
    target_index: &[usize],
) -> Result<(f64, Ten64), NetError> {
    let (batch, classes) = check_targets("softmax_with_cross_entropy", predictions, target_index)?;

    let probs = softmax(predictions)?;
    let loss = cross_entropy_loss(&probs, target_index)?;

    let mut grad = probs;
    for (row, &t) in target_index.iter().enumerate() {
        grad.data[row * classes + t] -= 1.0;
    }
    if predictions.rank() == 2 {
        let scale = batch as f64;
        grad.data.iter_mut().for_each(|g| *g /= scale);
    }

    Ok((loss, grad))
}
