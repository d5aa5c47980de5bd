//! Finite-difference gradient checking.
//!
//! Each check compares an analytic gradient against the centered difference
//!
//! ```text
//!   (f(x + δ·eᵢ) − f(x − δ·eᵢ)) / 2δ
//! ```
//!
//! for every element `i`, and reports the first element where the two
//! disagree beyond the relative tolerance.
//!
//! Layer checks reduce the layer output to a scalar with a fixed random
//! weighting `L = Σ forward(x) ⊙ R`, whose output gradient is `R` itself.
//!
//! # Example
//! ```rust
//! use convgrad::{approx, gradcheck::check_gradient, tensor};
//!
//! // f(x) = Σ x², ∇f = 2x
//! let x = tensor!([1.0, -2.0, 3.0]);
//! check_gradient(
//!     |x| Ok((x.data.iter().map(|v| v * v).sum(), x.map(|v| 2.0 * v))),
//!     &x,
//!     approx::DEFAULT_DELTA,
//!     approx::DEFAULT_TOLERANCE,
//! )
//! .unwrap();
//! ```

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::approx::{F64_ABS_TOLERANCE, is_close};
use crate::error::NetError;
use crate::layers::{Layer, expect_shape};
use crate::tensors::{Ten64, Tensor};

/// Checks the analytic gradient returned by `f` against a numeric estimate.
///
/// `f(x)` must return `(loss, dloss/dx)`. `x` itself is never modified.
///
/// # Errors
/// - [`NetError::GradientMismatch`] at the first disagreeing element
/// - [`NetError::ShapeMismatch`] if the analytic gradient is not shaped like `x`
/// - any error `f` returns
pub fn check_gradient<F>(mut f: F, x: &Ten64, delta: f64, tol: f64) -> Result<(), NetError>
where
    F: FnMut(&Ten64) -> Result<(f64, Ten64), NetError>,
{
    let (_, analytic) = f(x)?;
    expect_shape("check_gradient", &x.shape, &analytic.shape)?;

    let mut probe = x.clone();
    for index in 0..x.len() {
        let orig = probe.data[index];

        probe.data[index] = orig + delta;
        let (plus, _) = f(&probe)?;
        probe.data[index] = orig - delta;
        let (minus, _) = f(&probe)?;
        probe.data[index] = orig;

        let numeric = (plus - minus) / (2.0 * delta);
        let analytic = analytic.data[index];
        if !is_close(analytic, numeric, tol, F64_ABS_TOLERANCE) {
            log::warn!(
                "gradient mismatch at element {index}: analytic {analytic}, numeric {numeric}"
            );
            return Err(NetError::GradientMismatch {
                index,
                analytic,
                numeric,
            });
        }
    }

    log::debug!("gradient check passed for {} elements", x.len());
    Ok(())
}

fn random_like<R: Rng + ?Sized>(t: &Ten64, rng: &mut R) -> Ten64 {
    let data = (0..t.len())
        .map(|_| -> f64 { StandardNormal.sample(&mut *rng) })
        .collect();
    Tensor::new(t.shape.clone(), data)
}

/// Checks the input gradient of `layer` at `x`.
///
/// Parameter gradients of `layer` accumulate as a side effect of the
/// backward passes this runs; zero them afterwards if they matter.
///
/// # Errors
/// As for [`check_gradient`], plus any error from the layer itself.
pub fn check_layer_gradient<L, R>(
    layer: &mut L,
    x: &Ten64,
    rng: &mut R,
    delta: f64,
    tol: f64,
) -> Result<(), NetError>
where
    L: Layer + ?Sized,
    R: Rng + ?Sized,
{
    let out = layer.forward(x)?;
    let weights = random_like(&out, rng);

    check_gradient(
        |x| {
            let out = layer.forward(x)?;
            let loss = out.hadamard(&weights).sum();
            let grad = layer.backward(&weights)?;
            Ok((loss, grad))
        },
        x,
        delta,
        tol,
    )
}

/// Checks the gradient `layer` accumulates into the parameter `param_name`.
///
/// The parameter's gradient is zeroed before every analytic evaluation, and
/// its value is restored once the check finishes.
///
/// # Errors
/// - [`NetError::UnknownParam`] if the layer has no such parameter
/// - otherwise as for [`check_gradient`]
pub fn check_layer_param_gradient<L, R>(
    layer: &mut L,
    x: &Ten64,
    param_name: &str,
    rng: &mut R,
    delta: f64,
    tol: f64,
) -> Result<(), NetError>
where
    L: Layer + ?Sized,
    R: Rng + ?Sized,
{
    let initial = layer.param_mut(param_name)?.value.clone();
    let out = layer.forward(x)?;
    let weights = random_like(&out, rng);

    let result = check_gradient(
        |w| {
            let param = layer.param_mut(param_name)?;
            param.value.update(w.clone());
            param.zero_grad();

            let out = layer.forward(x)?;
            let loss = out.hadamard(&weights).sum();
            layer.backward(&weights)?;
            Ok((loss, layer.param_mut(param_name)?.grad.clone()))
        },
        &initial,
        delta,
        tol,
    );

    layer.param_mut(param_name)?.value.update(initial);
    result
}
