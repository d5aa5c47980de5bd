//! Utilities to approximate equality of floating point values.

/// Default finite-difference step for gradient checks.
pub const DEFAULT_DELTA: f64 = 1e-5;

/// Default relative tolerance for gradient checks.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Absolute floor below which two values are always considered equal.
pub const F64_ABS_TOLERANCE: f64 = 1e-8;

/// Checks `|a - b| <= atol + rtol * |b|`.
///
/// `b` is the reference value. NaN is never close to anything.
///
/// # Example
/// ```rust
/// use convgrad::approx::is_close;
/// assert!(is_close(1.0 + 1e-7, 1.0, 1e-5, 0.0));
/// assert!(!is_close(1.1, 1.0, 1e-5, 0.0));
/// ```
pub fn is_close(a: f64, b: f64, rtol: f64, atol: f64) -> bool {
    (a - b).abs() <= atol + rtol * b.abs()
}

/// Element-wise [`is_close`] over two slices of equal length.
///
/// Slices of different lengths are never close.
pub fn all_close(a: &[f64], b: &[f64], rtol: f64, atol: f64) -> bool {
    a.len() == b.len()
        && a.iter()
            .zip(b)
            .all(|(&x, &y)| is_close(x, y, rtol, atol))
}

