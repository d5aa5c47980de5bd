//! Crate-wide error type.
//!
//! Every fallible layer, loss and metric operation returns [`NetError`].
//! Low-level kernels in [`crate::ops`] still assert their preconditions and
//! panic, so callers above them validate shapes first.

use thiserror::Error;

/// Errors produced by layers, losses, metrics and gradient checks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetError {
    /// A sliding window does not tile the input evenly, or does not fit at all.
    #[error(
        "Invalid output dimension: window {window} with stride {stride} and padding {padding} does not fit extent {extent}"
    )]
    InvalidOutputDimension {
        extent: usize,
        window: usize,
        padding: usize,
        stride: usize,
    },

    /// `backward` was called without a pending `forward`.
    #[error("{layer}: backward called without a matching forward")]
    MissingForward { layer: &'static str },

    #[error("{op}: expected shape {expected:?}, got {actual:?}")]
    ShapeMismatch {
        op: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("{op}: expected a rank-{expected} tensor, got shape {actual:?}")]
    RankMismatch {
        op: &'static str,
        expected: usize,
        actual: Vec<usize>,
    },

    /// Shape and data length disagree.
    #[error("shape {shape:?} is incompatible with {len} data elements")]
    InvalidTensor { shape: Vec<usize>, len: usize },

    #[error("target index {index} is out of range for {classes} classes")]
    TargetOutOfRange { index: usize, classes: usize },

    #[error("layer has no parameter named `{name}`")]
    UnknownParam { name: String },

    #[error("{op}: input is empty")]
    EmptyInput { op: &'static str },

    /// Analytic and numeric gradients disagree at a flat element index.
    #[error("gradient mismatch at element {index}: analytic {analytic}, numeric {numeric}")]
    GradientMismatch {
        index: usize,
        analytic: f64,
        numeric: f64,
    },
}
