use super::{Layer, expect_shape};
use crate::error::NetError;
use crate::tensors::Ten64;

/// Collapses every axis after the batch axis into one, e.g.
/// `(batch, height, width, channels)` into `(batch, height·width·channels)`.
#[derive(Debug, Default)]
pub struct Flattener {
    input_shape: Option<Vec<usize>>,
}

impl Flattener {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Layer for Flattener {
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError> {
        let Some(&batch) = input.shape.first() else {
            return Err(NetError::RankMismatch {
                op: "Flattener::forward",
                expected: 2,
                actual: input.shape.clone(),
            });
        };
        let features = input.shape[1..].iter().product::<usize>();

        self.input_shape = Some(input.shape.clone());
        input.clone().reshape(vec![batch, features])
    }

    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError> {
        let shape = self
            .input_shape
            .as_ref()
            .ok_or(NetError::MissingForward { layer: "Flattener" })?;
        let features = shape[1..].iter().product::<usize>();
        expect_shape("Flattener::backward", &[shape[0], features], &grad_output.shape)?;

        let shape = shape.clone();
        self.input_shape = None;
        grad_output.clone().reshape(shape)
    }
}
