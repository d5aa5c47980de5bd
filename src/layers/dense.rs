use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::{Layer, expect_rank, expect_shape};
use crate::error::NetError;
use crate::ops::cpu;
use crate::tensors::{Param, Ten64, Tensor};

/// Scale applied to the standard-normal initialization of weights and bias.
const INIT_SCALE: f64 = 0.001;

/// Affine layer `Y = X·W + B` over `(batch, n_input)` inputs.
#[derive(Debug)]
pub struct FullyConnectedLayer {
    /// Weights, `(n_input, n_output)`.
    pub weight: Param,
    /// Bias, `(1, n_output)`, broadcast over the batch.
    pub bias: Param,
    input: Option<Ten64>,
}

impl FullyConnectedLayer {
    /// Creates a layer initialized from the thread-local RNG.
    pub fn new(n_input: usize, n_output: usize) -> Self {
        Self::with_rng(n_input, n_output, &mut rand::rng())
    }

    /// Creates a layer with weights and bias drawn from `0.001 · N(0, 1)`.
    pub fn with_rng<R: Rng + ?Sized>(n_input: usize, n_output: usize, rng: &mut R) -> Self {
        let weight = scaled_normal(vec![n_input, n_output], rng);
        let bias = scaled_normal(vec![1, n_output], rng);
        Self {
            weight: Param::new(weight),
            bias: Param::new(bias),
            input: None,
        }
    }

    pub fn n_input(&self) -> usize {
        self.weight.value.shape[0]
    }

    pub fn n_output(&self) -> usize {
        self.weight.value.shape[1]
    }
}

fn scaled_normal<R: Rng + ?Sized>(shape: Vec<usize>, rng: &mut R) -> Ten64 {
    let len = shape.iter().product();
    let data = (0..len)
        .map(|_| {
            let z: f64 = StandardNormal.sample(&mut *rng);
            INIT_SCALE * z
        })
        .collect();
    Tensor::new(shape, data)
}

impl Layer for FullyConnectedLayer {
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError> {
        expect_rank("FullyConnectedLayer::forward", input, 2)?;
        expect_shape(
            "FullyConnectedLayer::forward",
            &[input.shape[0], self.n_input()],
            &input.shape,
        )?;
        log::trace!("dense forward {:?} -> {}", input.shape, self.n_output());

        let mut out = cpu::matmul(input, &self.weight.value);
        let n = self.n_output();
        if n > 0 {
            for row in out.data.chunks_mut(n) {
                for (y, b) in row.iter_mut().zip(&self.bias.value.data) {
                    *y += b;
                }
            }
        }

        self.input = Some(input.clone());
        Ok(out)
    }

    /// Accumulates `Xᵀ·dY` into the weight gradient and the batch sum of
    /// `dY` into the bias gradient; returns `dY·Wᵀ`.
    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError> {
        let input = self.input.as_ref().ok_or(NetError::MissingForward {
            layer: "FullyConnectedLayer",
        })?;
        expect_shape(
            "FullyConnectedLayer::backward",
            &[input.shape[0], self.n_output()],
            &grad_output.shape,
        )?;

        self.weight
            .grad
            .accumulate(&cpu::matmul_tn(input, grad_output));
        self.bias.grad.accumulate(&cpu::sum_rows(grad_output));
        let grad_input = cpu::matmul_nt(grad_output, &self.weight.value);

        self.input = None;
        Ok(grad_input)
    }

    fn params(&self) -> Vec<(&'static str, &Param)> {
        vec![("W", &self.weight), ("B", &self.bias)]
    }

    fn params_mut(&mut self) -> Vec<(&'static str, &mut Param)> {
        vec![("W", &mut self.weight), ("B", &mut self.bias)]
    }
}
