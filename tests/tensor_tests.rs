use convgrad::error::NetError;
use convgrad::tensor;
use convgrad::tensors::{Param, Ten64, Tensor};

#[test]
fn test_tensor_creation() {
    let t = Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(t.shape, vec![2, 2]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0]);
}

#[test]
fn test_tensor_shape_mismatch_panics() {
    let result = std::panic::catch_unwind(|| {
        Tensor::new(vec![2, 2], vec![1.0, 2.0, 3.0]);
    });
    assert!(result.is_err());
}

#[test]
fn test_try_new_rejects_bad_length() {
    let err = Tensor::try_new(vec![2, 3], vec![0.0; 5]).unwrap_err();
    assert_eq!(
        err,
        NetError::InvalidTensor {
            shape: vec![2, 3],
            len: 5
        }
    );
    assert!(Tensor::try_new(vec![3, 2], vec![0.0; 6]).is_ok());
}

#[test]
fn test_tensor_macro() {
    let t = tensor!([[1.0, 2.0], [3.0, 4.0]]);
    assert_eq!(t.shape, vec![2, 2]);
    assert_eq!(t.data, vec![1.0, 2.0, 3.0, 4.0]);

    let n = tensor!([[[-1.0], [2.5]], [[0.0], [-3.0]]]);
    assert_eq!(n.shape, vec![2, 2, 1]);
    assert_eq!(n.data, vec![-1.0, 2.5, 0.0, -3.0]);
}

#[test]
fn test_reshape_keeps_data() {
    let t = tensor!([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    let r = t.clone().reshape(vec![3, 2]).unwrap();
    assert_eq!(r.shape, vec![3, 2]);
    assert_eq!(r.data, t.data);
    assert!(t.reshape(vec![4, 2]).is_err());
}

#[test]
fn test_permute_nhwc_nchw_round_trip() {
    let len = 2 * 3 * 4 * 5;
    let t = Tensor::new(vec![2, 3, 4, 5], (0..len).map(|x| x as f64).collect());
    let nchw = t.permute(&[0, 3, 1, 2]);
    assert_eq!(nchw.shape, vec![2, 5, 3, 4]);
    // element (n=1, h=2, w=3, c=4) lands at (n=1, c=4, h=2, w=3)
    let src = ((1 * 3 + 2) * 4 + 3) * 5 + 4;
    let dst = ((1 * 5 + 4) * 3 + 2) * 4 + 3;
    assert_eq!(nchw.data[dst], t.data[src]);
    assert_eq!(nchw.permute(&[0, 2, 3, 1]), t);
}

#[test]
fn test_param_zero_grad() {
    let mut p = Param::new(tensor!([1.0, 2.0]));
    assert_eq!(p.grad, Ten64::zeros(vec![2]));
    p.grad.accumulate(&tensor!([0.5, 0.5]));
    p.grad.accumulate(&tensor!([0.5, 1.5]));
    assert_eq!(p.grad.data, vec![1.0, 2.0]);
    p.zero_grad();
    assert_eq!(p.grad.data, vec![0.0, 0.0]);
    assert_eq!(p.value.data, vec![1.0, 2.0]);
}
