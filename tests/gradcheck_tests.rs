use convgrad::approx::{DEFAULT_DELTA, DEFAULT_TOLERANCE};
use convgrad::error::NetError;
use convgrad::gradcheck::{check_gradient, check_layer_param_gradient};
use convgrad::layers::{FullyConnectedLayer, Layer, ReLULayer};
use convgrad::tensor;
use convgrad::tensors::Ten64;

use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_check_gradient_accepts_correct_gradient() {
    let x = tensor!([[3.0, -0.5], [0.25, 2.0]]);
    // f(x) = Σ x³
    check_gradient(
        |x| Ok((x.data.iter().map(|v| v * v * v).sum(), x.map(|v| 3.0 * v * v))),
        &x,
        DEFAULT_DELTA,
        DEFAULT_TOLERANCE,
    )
    .unwrap();
}

#[test]
fn test_check_gradient_reports_wrong_gradient() {
    let x = tensor!([1.0, 2.0, 3.0]);
    let err = check_gradient(
        |x| {
            let mut grad = x.map(|v| 2.0 * v);
            grad.data[1] += 0.5;
            Ok((x.data.iter().map(|v| v * v).sum(), grad))
        },
        &x,
        DEFAULT_DELTA,
        DEFAULT_TOLERANCE,
    )
    .unwrap_err();

    match err {
        NetError::GradientMismatch {
            index, analytic, ..
        } => {
            assert_eq!(index, 1);
            assert_eq!(analytic, 4.5);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_check_gradient_rejects_misshapen_gradient() {
    let x = tensor!([1.0, 2.0]);
    let err = check_gradient(|_| Ok((0.0, Ten64::zeros(vec![3]))), &x, 1e-5, 1e-4).unwrap_err();
    assert!(matches!(err, NetError::ShapeMismatch { .. }));
}

#[test]
fn test_param_check_restores_value() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut layer = FullyConnectedLayer::with_rng(3, 2, &mut rng);
    let before = layer.weight.value.clone();
    let x = tensor!([[0.1, -0.2, 0.3]]);

    check_layer_param_gradient(&mut layer, &x, "W", &mut rng, DEFAULT_DELTA, DEFAULT_TOLERANCE)
        .unwrap();
    assert_eq!(layer.weight.value, before);
}

#[test]
fn test_param_check_unknown_name() {
    let mut rng = StdRng::seed_from_u64(22);
    let mut layer = ReLULayer::new();
    let x = tensor!([[1.0]]);
    assert!(layer.params().is_empty());
    assert!(matches!(
        check_layer_param_gradient(&mut layer, &x, "W", &mut rng, DEFAULT_DELTA, DEFAULT_TOLERANCE),
        Err(NetError::UnknownParam { .. })
    ));
}
