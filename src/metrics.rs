//! Classification quality metrics.

use crate::error::NetError;

/// Summary of a binary classifier's predictions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

fn check_lengths(op: &'static str, prediction: usize, ground_truth: usize) -> Result<(), NetError> {
    if prediction != ground_truth {
        return Err(NetError::ShapeMismatch {
            op,
            expected: vec![ground_truth],
            actual: vec![prediction],
        });
    }
    if ground_truth == 0 {
        return Err(NetError::EmptyInput { op });
    }
    Ok(())
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

/// Computes accuracy, precision, recall and F1 for boolean labels, where
/// `true` is the positive class.
///
/// Precision, recall and F1 are 0 when their denominator is 0.
///
/// # Errors
/// - [`NetError::ShapeMismatch`] if the slices differ in length
/// - [`NetError::EmptyInput`] if they are empty
pub fn binary_classification_metrics(
    prediction: &[bool],
    ground_truth: &[bool],
) -> Result<BinaryMetrics, NetError> {
    check_lengths("binary_classification_metrics", prediction.len(), ground_truth.len())?;

    let (mut tp, mut fp, mut fn_, mut tn) = (0usize, 0usize, 0usize, 0usize);
    for (&p, &t) in prediction.iter().zip(ground_truth) {
        match (p, t) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => tn += 1,
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Ok(BinaryMetrics {
        accuracy: ratio(tp + tn, ground_truth.len()),
        precision,
        recall,
        f1,
    })
}

/// Computes the fraction of predictions equal to the ground truth.
///
/// # Errors
/// - [`NetError::ShapeMismatch`] if the slices differ in length
/// - [`NetError::EmptyInput`] if they are empty
///
/// # Example
/// ```rust
/// use convgrad::metrics::multiclass_accuracy;
///
/// let acc = multiclass_accuracy(&[1, 2, 2], &[1, 2, 3]).unwrap();
/// assert!((acc - 2.0 / 3.0).abs() < 1e-12);
/// ```
pub fn multiclass_accuracy<T: PartialEq>(prediction: &[T], ground_truth: &[T]) -> Result<f64, NetError> {
    check_lengths("multiclass_accuracy", prediction.len(), ground_truth.len())?;
    let correct = prediction
        .iter()
        .zip(ground_truth)
        .filter(|(a, b)| a == b)
        .count();
    Ok(ratio(correct, ground_truth.len()))
}
