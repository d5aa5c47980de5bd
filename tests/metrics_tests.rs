use convgrad::error::NetError;
use convgrad::metrics::{BinaryMetrics, binary_classification_metrics, multiclass_accuracy};

#[test]
fn test_multiclass_accuracy() {
    let acc = multiclass_accuracy(&[1, 2, 2], &[1, 2, 3]).unwrap();
    assert!((acc - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(multiclass_accuracy(&[0, 0], &[0, 0]).unwrap(), 1.0);
}

#[test]
fn test_multiclass_accuracy_rejects_bad_input() {
    assert!(matches!(
        multiclass_accuracy(&[1, 2], &[1]),
        Err(NetError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        multiclass_accuracy::<u8>(&[], &[]),
        Err(NetError::EmptyInput { .. })
    ));
}

#[test]
fn test_binary_classification_metrics() {
    let prediction = [true, true, false, false, true];
    let ground_truth = [true, false, false, true, true];
    let m = binary_classification_metrics(&prediction, &ground_truth).unwrap();

    // tp = 2, fp = 1, fn = 1, tn = 1
    assert!((m.accuracy - 0.6).abs() < 1e-12);
    assert!((m.precision - 2.0 / 3.0).abs() < 1e-12);
    assert!((m.recall - 2.0 / 3.0).abs() < 1e-12);
    assert!((m.f1 - 2.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_binary_metrics_without_positives() {
    let m = binary_classification_metrics(&[false, false], &[false, false]).unwrap();
    assert_eq!(
        m,
        BinaryMetrics {
            accuracy: 1.0,
            precision: 0.0,
            recall: 0.0,
            f1: 0.0
        }
    );
}
