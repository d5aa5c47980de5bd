use super::{Layer, expect_rank, expect_shape};
use crate::error::NetError;
use crate::im2col::{Window, col2im, im2col};
use crate::tensors::{Ten64, Tensor};

/// State kept between forward and backward.
#[derive(Debug)]
struct PoolCache {
    input_shape: Vec<usize>,
    output_shape: Vec<usize>,
    /// Winning row of every im2col column.
    argmax: Vec<usize>,
}

/// Max pooling over `(batch, height, width, channels)` inputs, each channel
/// pooled independently. Has no parameters.
#[derive(Debug)]
pub struct MaxPoolingLayer {
    pool_size: usize,
    stride: usize,
    cache: Option<PoolCache>,
}

impl MaxPoolingLayer {
    pub fn new(pool_size: usize, stride: usize) -> Self {
        Self {
            pool_size,
            stride,
            cache: None,
        }
    }

    fn window(&self) -> Window {
        Window::new(self.pool_size, 0, self.stride)
    }
}

impl Layer for MaxPoolingLayer {
    /// # Errors
    /// [`NetError::InvalidOutputDimension`] unless `pool_size` and `stride`
    /// tile both spatial extents exactly.
    fn forward(&mut self, input: &Ten64) -> Result<Ten64, NetError> {
        expect_rank("MaxPoolingLayer::forward", input, 4)?;
        let (batch, height, width, channels) = (
            input.shape[0],
            input.shape[1],
            input.shape[2],
            input.shape[3],
        );

        let window = self.window();
        let dims = window
            .exact_output_dim(height)
            .and_then(|h| Ok((h, window.exact_output_dim(width)?)));
        let (out_h, out_w) = match dims {
            Ok(dims) => dims,
            Err(e) => {
                log::warn!("max pooling rejected input {:?}: {e}", input.shape);
                return Err(e);
            }
        };

        // every (sample, channel) plane becomes its own single-channel image
        let planes = Tensor::new(
            vec![batch * channels, 1, height, width],
            input.permute(&[0, 3, 1, 2]).data,
        );
        let cols = im2col(&planes, window)?;
        let (rows, n_cols) = (cols.shape[0], cols.shape[1]);

        let mut argmax = vec![0usize; n_cols];
        let mut out = vec![0.0; n_cols];
        for (col, (best_row, best)) in argmax.iter_mut().zip(out.iter_mut()).enumerate() {
            *best = cols.data[col];
            for row in 1..rows {
                let v = cols.data[row * n_cols + col];
                // strict comparison keeps the first maximum on ties
                if v > *best {
                    *best = v;
                    *best_row = row;
                }
            }
        }

        let output_shape = vec![batch, out_h, out_w, channels];
        log::trace!("max pool forward {:?} -> {:?}", input.shape, output_shape);
        let out = Tensor::new(vec![out_h, out_w, batch, channels], out).permute(&[2, 0, 1, 3]);

        self.cache = Some(PoolCache {
            input_shape: input.shape.clone(),
            output_shape,
            argmax,
        });
        Ok(out)
    }

    /// Routes each output gradient to the input position that won the max.
    fn backward(&mut self, grad_output: &Ten64) -> Result<Ten64, NetError> {
        let cache = self.cache.as_ref().ok_or(NetError::MissingForward {
            layer: "MaxPoolingLayer",
        })?;
        expect_shape(
            "MaxPoolingLayer::backward",
            &cache.output_shape,
            &grad_output.shape,
        )?;

        let (batch, height, width, channels) = (
            cache.input_shape[0],
            cache.input_shape[1],
            cache.input_shape[2],
            cache.input_shape[3],
        );
        let rows = self.pool_size * self.pool_size;
        let n_cols = cache.argmax.len();

        // (batch, oh, ow, c) -> (oh, ow, batch, c), matching the column order
        let flat = grad_output.permute(&[1, 2, 0, 3]).data;
        let mut grad_cols = vec![0.0; rows * n_cols];
        for (col, (&row, &g)) in cache.argmax.iter().zip(&flat).enumerate() {
            grad_cols[row * n_cols + col] = g;
        }

        let grad_planes = col2im(
            &Tensor::new(vec![rows, n_cols], grad_cols),
            [batch * channels, 1, height, width],
            self.window(),
        )?;
        let grad_input = Tensor::new(vec![batch, channels, height, width], grad_planes.data)
            .permute(&[0, 2, 3, 1]);

        self.cache = None;
        Ok(grad_input)
    }
}
