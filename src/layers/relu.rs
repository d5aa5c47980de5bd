use super::{Layer, expect_shape};
use crate::error::NetError;
use crate::ops::cpu;
use crate::tensors::Ten64;

/// Rectified linear unit, `max(0, x)` element-wise. Has no parameters.
#[derive(Debug, Default)]
pub struct ReLULayer {
    input: Option<Ten64>,
}

impl ReLULayer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for ReLULayer {
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError> {
        log::trace!("relu forward {:?}", input.shape);
        let out = cpu::relu(input);
        self.input = Some(input.clone());
        Ok(out)
    }

    /// Passes gradient only where the cached input was strictly positive.
    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError> {
        let input = self
            .input
            .as_ref()
            .ok_or(NetError::MissingForward { layer: "ReLULayer" })?;
        expect_shape("ReLULayer::backward", &input.shape, &grad_output.shape)?;

        let grad = cpu::relu_mask(input, grad_output);
        self.input = None;
        Ok(grad)
    }
}
