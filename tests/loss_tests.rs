use convgrad::approx::{DEFAULT_DELTA, DEFAULT_TOLERANCE, is_close};
use convgrad::error::NetError;
use convgrad::gradcheck::check_gradient;
use convgrad::loss::{cross_entropy_loss, l2_regularization, softmax, softmax_with_cross_entropy};
use convgrad::tensor;

#[test]
fn test_softmax_vector_sums_to_one() {
    let probs = softmax(&tensor!([1.0, 2.0, 3.0])).unwrap();
    assert!(is_close(probs.data.iter().sum(), 1.0, 1e-12, 0.0));
    assert!(probs.data.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_softmax_is_stable_for_large_scores() {
    let probs = softmax(&tensor!([[1000.0, 0.0, 0.0], [0.0, 0.0, 0.0]])).unwrap();
    assert!(probs.data.iter().all(|p| p.is_finite()));
    assert!(is_close(probs.data[0], 1.0, 1e-12, 0.0));
    for p in &probs.data[3..] {
        assert!(is_close(*p, 1.0 / 3.0, 1e-12, 0.0));
    }
}

#[test]
fn test_softmax_rejects_rank_three() {
    let t = convgrad::tensors::Ten64::zeros(vec![1, 1, 3]);
    assert!(matches!(softmax(&t), Err(NetError::RankMismatch { .. })));
}

#[test]
fn test_cross_entropy_batch_average() {
    let probs = tensor!([[0.5, 0.5], [0.25, 0.75]]);
    let loss = cross_entropy_loss(&probs, &[0, 1]).unwrap();
    let expected = -(0.5f64.ln() + 0.75f64.ln()) / 2.0;
    assert!(is_close(loss, expected, 1e-12, 0.0));
}

#[test]
fn test_softmax_with_cross_entropy_single_row() {
    let predictions = tensor!([[1.0, 0.0, 0.0]]);
    let (loss, grad) = softmax_with_cross_entropy(&predictions, &[0]).unwrap();

    let p0 = softmax(&tensor!([1.0, 0.0, 0.0])).unwrap().data[0];
    assert!(is_close(loss, -p0.ln(), 1e-12, 0.0));
    assert_eq!(grad.shape, vec![1, 3]);
    assert!(grad.data.iter().sum::<f64>().abs() < 1e-12);
    assert!(grad.data[0] < 0.0);
}

#[test]
fn test_softmax_with_cross_entropy_unbatched() {
    let predictions = tensor!([2.0, -1.0, 0.5]);
    let (loss, grad) = softmax_with_cross_entropy(&predictions, &[2]).unwrap();
    let probs = softmax(&predictions).unwrap();
    assert!(is_close(loss, -probs.data[2].ln(), 1e-12, 0.0));
    // no batch averaging for a single vector
    assert!(is_close(grad.data[2], probs.data[2] - 1.0, 1e-12, 0.0));
}

#[test]
fn test_softmax_with_cross_entropy_gradient_rows_sum_to_zero() {
    let predictions = tensor!([[1.0, 2.0, -1.0, 0.5], [0.0, 3.0, 1.0, -2.0], [0.3, 0.1, 0.2, 0.9]]);
    let (_, grad) = softmax_with_cross_entropy(&predictions, &[3, 1, 0]).unwrap();
    for row in grad.data.chunks(4) {
        assert!(row.iter().sum::<f64>().abs() < 1e-12);
    }
}

#[test]
fn test_softmax_with_cross_entropy_numeric_gradient() {
    let predictions = tensor!([[1.0, 2.0, -1.0, 0.5], [0.0, 3.0, 1.0, -2.0]]);
    check_gradient(
        |p| softmax_with_cross_entropy(p, &[1, 2]),
        &predictions,
        DEFAULT_DELTA,
        DEFAULT_TOLERANCE,
    )
    .unwrap();
}

#[test]
fn test_target_validation() {
    let predictions = tensor!([[1.0, 2.0], [3.0, 4.0]]);
    assert!(matches!(
        softmax_with_cross_entropy(&predictions, &[0]),
        Err(NetError::ShapeMismatch { .. })
    ));
    assert_eq!(
        softmax_with_cross_entropy(&predictions, &[0, 2]).unwrap_err(),
        NetError::TargetOutOfRange {
            index: 2,
            classes: 2
        }
    );
}

#[test]
fn test_l2_regularization() {
    let w = tensor!([[1.0, -2.0], [3.0, 0.0]]);
    let (loss, grad) = l2_regularization(&w, 0.1);
    assert!(is_close(loss, 1.4, 1e-12, 0.0));
    assert_eq!(grad.shape, w.shape);
    check_gradient(
        |w| Ok(l2_regularization(w, 0.1)),
        &w,
        DEFAULT_DELTA,
        DEFAULT_TOLERANCE,
    )
    .unwrap();
}
