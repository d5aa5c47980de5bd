use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use super::{Layer, expect_rank, expect_shape};
use crate::error::NetError;
use crate::im2col::{Window, col2im, im2col};
use crate::ops::cpu;
use crate::tensors::{Param, Ten64, Tensor};

/// Convolutions always step one pixel at a time.
const STRIDE: usize = 1;

/// 2-D convolution over `(batch, height, width, channels)` inputs, computed as
/// one matrix product over im2col columns.
///
/// The weight tensor is `(filter_size, filter_size, in_channels, out_channels)`.
/// For the product its row-major data is read directly as an
/// `(out_channels, filter_size² · in_channels)` matrix, and the weight
/// gradient is folded back the same way, so forward and backward agree on
/// which element multiplies which tap.
#[derive(Debug)]
pub struct ConvolutionalLayer {
    pub weight: Param,
    /// Bias, `(out_channels,)`.
    pub bias: Param,
    filter_size: usize,
    padding: usize,
    in_channels: usize,
    out_channels: usize,
    input: Option<Ten64>,
}

impl ConvolutionalLayer {
    /// Creates a layer initialized from the thread-local RNG.
    pub fn new(in_channels: usize, out_channels: usize, filter_size: usize, padding: usize) -> Self {
        Self::with_rng(in_channels, out_channels, filter_size, padding, &mut rand::rng())
    }

    /// Creates a layer with standard-normal weights and zero bias.
    ///
    /// `padding` pixels of zeros are added on every side of the input.
    pub fn with_rng<R: Rng + ?Sized>(
        in_channels: usize,
        out_channels: usize,
        filter_size: usize,
        padding: usize,
        rng: &mut R,
    ) -> Self {
        let shape = vec![filter_size, filter_size, in_channels, out_channels];
        let len = shape.iter().product();
        let data = (0..len)
            .map(|_| -> f64 { StandardNormal.sample(&mut *rng) })
            .collect();

        Self {
            weight: Param::new(Tensor::new(shape, data)),
            bias: Param::new(Ten64::zeros(vec![out_channels])),
            filter_size,
            padding,
            in_channels,
            out_channels,
            input: None,
        }
    }

    fn window(&self) -> Window {
        Window::new(self.filter_size, self.padding, STRIDE)
    }

    /// Number of rows of the im2col matrix: one per kernel tap.
    fn taps(&self) -> usize {
        self.filter_size * self.filter_size * self.in_channels
    }

    /// The weights viewed as an `(out_channels, taps)` matrix.
    fn weight_matrix(&self) -> Ten64 {
        Tensor::new(
            vec![self.out_channels, self.taps()],
            self.weight.value.data.clone(),
        )
    }

    /// Permutes NHWC input to NCHW and unfolds it.
    fn columns(&self, input: &Ten64) -> Result<Ten64, NetError> {
        im2col(&input.permute(&[0, 3, 1, 2]), self.window())
    }

    /// Output shape for an NHWC input; spatial extents truncate like [`Window::output_dim`].
    fn output_shape(&self, input_shape: &[usize]) -> Result<Vec<usize>, NetError> {
        let window = self.window();
        Ok(vec![
            input_shape[0],
            window.output_dim(input_shape[1])?,
            window.output_dim(input_shape[2])?,
            self.out_channels,
        ])
    }
}

impl Layer for ConvolutionalLayer {
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError> {
        expect_rank("ConvolutionalLayer::forward", input, 4)?;
        let [batch, height, width, _] = [
            input.shape[0],
            input.shape[1],
            input.shape[2],
            input.shape[3],
        ];
        expect_shape(
            "ConvolutionalLayer::forward",
            &[batch, height, width, self.in_channels],
            &input.shape,
        )?;

        let out_shape = self.output_shape(&input.shape)?;
        let (out_h, out_w) = (out_shape[1], out_shape[2]);
        log::trace!("conv forward {:?} -> {:?}", input.shape, out_shape);

        let cols = self.columns(input)?;
        let mut out = cpu::matmul(&self.weight_matrix(), &cols);
        let n_cols = cols.shape[1];
        if n_cols > 0 {
            for (row, &b) in out.data.chunks_mut(n_cols).zip(&self.bias.value.data) {
                row.iter_mut().for_each(|y| *y += b);
            }
        }

        let out = Tensor::new(vec![self.out_channels, out_h, out_w, batch], out.data)
            .permute(&[3, 1, 2, 0]);

        self.input = Some(input.clone());
        Ok(out)
    }

    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError> {
        let input = self.input.as_ref().ok_or(NetError::MissingForward {
            layer: "ConvolutionalLayer",
        })?;
        let out_shape = self.output_shape(&input.shape)?;
        expect_shape(
            "ConvolutionalLayer::backward",
            &out_shape,
            &grad_output.shape,
        )?;
        log::trace!("conv backward {:?}", grad_output.shape);

        let cols = self.columns(input)?;
        let n_cols = cols.shape[1];

        // (batch, oh, ow, oc) -> (oc, oh, ow, batch), matching the column order
        let grad_rows = grad_output.permute(&[3, 1, 2, 0]);
        let grad_rows = Tensor::new(vec![self.out_channels, n_cols], grad_rows.data);

        let bias_grad: Vec<f64> = if n_cols > 0 {
            grad_rows.data.chunks(n_cols).map(|r| r.iter().sum()).collect()
        } else {
            vec![0.0; self.out_channels]
        };
        self.bias
            .grad
            .accumulate(&Tensor::new(vec![self.out_channels], bias_grad));

        let weight_grad = cpu::matmul_nt(&grad_rows, &cols);
        self.weight
            .grad
            .accumulate(&Tensor::new(self.weight.value.shape.clone(), weight_grad.data));

        let grad_cols = cpu::matmul_tn(&self.weight_matrix(), &grad_rows);
        let nchw = [input.shape[0], self.in_channels, input.shape[1], input.shape[2]];
        let grad_input = col2im(&grad_cols, nchw, self.window())?.permute(&[0, 2, 3, 1]);

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
