//! Sliding-window unfolding for convolution and pooling.
//!
//! `im2col` extracts every receptive field of a `(N, C, H, W)` tensor as one
//! column of a matrix so that a convolution becomes a single matrix product:
//!
//! ```text
//!   cols = im2col(x)       shape: [C * k * k, out_h * out_w * N]
//!   out  = W · cols        shape: [C_out,     out_h * out_w * N]
//! ```
//!
//! Row `c * k * k + kh * k + kw` holds kernel tap `(c, kh, kw)`; column
//! `(oh * out_w + ow) * N + n` holds output position `(oh, ow)` of sample `n`.
//!
//! `col2im` is the adjoint: it scatters columns back into image layout,
//! summing contributions of overlapping windows.

use rayon::prelude::*;

use crate::error::NetError;
use crate::tensors::{Ten64, Tensor};

/// A square sliding window with symmetric zero padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub size: usize,
    pub padding: usize,
    pub stride: usize,
}

impl Window {
    pub fn new(size: usize, padding: usize, stride: usize) -> Self {
        Self {
            size,
            padding,
            stride,
        }
    }

    fn invalid(&self, extent: usize) -> NetError {
        NetError::InvalidOutputDimension {
            extent,
            window: self.size,
            padding: self.padding,
            stride: self.stride,
        }
    }

    /// Output extent `floor((extent + 2p - size) / stride) + 1`.
    ///
    /// A stride that does not divide the span evenly is silently truncated.
    ///
    /// # Errors
    /// [`NetError::InvalidOutputDimension`] if the window does not fit the
    /// padded extent at all, or the stride is zero.
    pub fn output_dim(&self, extent: usize) -> Result<usize, NetError> {
        let padded = extent + 2 * self.padding;
        if self.stride == 0 || self.size == 0 || self.size > padded {
            return Err(self.invalid(extent));
        }
        Ok((padded - self.size) / self.stride + 1)
    }

    /// Like [`Window::output_dim`], but also rejects strides that leave a remainder.
    ///
    /// # Errors
    /// [`NetError::InvalidOutputDimension`] if the windows do not tile the extent exactly.
    pub fn exact_output_dim(&self, extent: usize) -> Result<usize, NetError> {
        let out = self.output_dim(extent)?;
        let span = extent + 2 * self.padding - self.size;
        if span % self.stride != 0 {
            return Err(self.invalid(extent));
        }
        Ok(out)
    }
}

fn dims4(shape: &[usize]) -> [usize; 4] {
    assert_eq!(shape.len(), 4, "expected (N, C, H, W), got {shape:?}");
    [shape[0], shape[1], shape[2], shape[3]]
}

/// Unfolds the receptive fields of `input` into columns.
///
/// `input` is `(N, C, H, W)`; the result is
/// `(C * size * size, out_h * out_w * N)`, with output extents from
/// [`Window::output_dim`]. Positions in the padding read as zero.
///
/// # Errors
/// [`NetError::InvalidOutputDimension`] if the window does not fit.
///
/// # Panics
/// Panics if `input` is not 4-D.
pub fn im2col(input: &Ten64, window: Window) -> Result<Ten64, NetError> {
    let [n, c, h, w] = dims4(&input.shape);
    let out_h = window.output_dim(h)?;
    let out_w = window.output_dim(w)?;
    let k = window.size;
    let (pad, stride) = (window.padding, window.stride);

    let rows = c * k * k;
    let cols = out_h * out_w * n;
    let mut data = vec![0.0; rows * cols];
    let src = &input.data;

    if cols > 0 {
        data.par_chunks_mut(cols).enumerate().for_each(|(row, out)| {
            let ci = row / (k * k);
            let kh = (row / k) % k;
            let kw = row % k;
            for oh in 0..out_h {
                // padded coordinate minus padding; negative means inside the pad
                let ih = (oh * stride + kh) as isize - pad as isize;
                for ow in 0..out_w {
                    let iw = (ow * stride + kw) as isize - pad as isize;
                    let base = (oh * out_w + ow) * n;
                    if ih < 0 || ih >= h as isize || iw < 0 || iw >= w as isize {
                        continue;
                    }
                    let (ih, iw) = (ih as usize, iw as usize);
                    for b in 0..n {
                        out[base + b] = src[((b * c + ci) * h + ih) * w + iw];
                    }
                }
            }
        });
    }

    Ok(Tensor::new(vec![rows, cols], data))
}

/// Folds columns back into a `(N, C, H, W)` tensor of shape `shape`.
///
/// Every column entry is added into the input position it was read from, so
/// pixels shared by overlapping windows receive the sum of their
/// contributions. Contributions landing in the padding are dropped.
///
/// # Errors
/// [`NetError::InvalidOutputDimension`] if the window does not fit, and
/// [`NetError::ShapeMismatch`] if `cols` is not the shape [`im2col`] would
/// produce for `shape`.
pub fn col2im(cols: &Ten64, shape: [usize; 4], window: Window) -> Result<Ten64, NetError> {
    let [n, c, h, w] = shape;
    let out_h = window.output_dim(h)?;
    let out_w = window.output_dim(w)?;
    let k = window.size;
    let (pad, stride) = (window.padding, window.stride);

    let expected = vec![c * k * k, out_h * out_w * n];
    if cols.shape != expected {
        return Err(NetError::ShapeMismatch {
            op: "col2im",
            expected,
            actual: cols.shape.clone(),
        });
    }

    let (hp, wp) = (h + 2 * pad, w + 2 * pad);
    let n_cols = out_h * out_w * n;
    let mut padded = vec![0.0; n * c * hp * wp];
    let src = &cols.data;

    // One task per (sample, channel) plane: no two tasks touch the same pixel.
    if hp * wp > 0 {
        padded
            .par_chunks_mut(hp * wp)
            .enumerate()
            .for_each(|(plane_idx, plane)| {
                let b = plane_idx / c;
                let ci = plane_idx % c;
                for kh in 0..k {
                    for kw in 0..k {
                        let row = (ci * k + kh) * k + kw;
                        let row_data = &src[row * n_cols..(row + 1) * n_cols];
                        for oh in 0..out_h {
                            for ow in 0..out_w {
                                let y = oh * stride + kh;
                                let x = ow * stride + kw;
                                plane[y * wp + x] += row_data[(oh * out_w + ow) * n + b];
                            }
                        }
                    }
                }
            });
    }

    if pad == 0 {
        return Ok(Tensor::new(shape.to_vec(), padded));
    }

    let mut data = Vec::with_capacity(n * c * h * w);
    for plane in padded.chunks(hp * wp) {
        for y in pad..pad + h {
            data.extend_from_slice(&plane[y * wp + pad..y * wp + pad + w]);
        }
    }
    Ok(Tensor::new(shape.to_vec(), data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arange(shape: Vec<usize>) -> Ten64 {
        let len = shape.iter().product();
        Tensor::new(shape, (0..len).map(|x| x as f64).collect())
    }

    #[test]
    fn output_dim_truncates_but_exact_rejects() {
        let w = Window::new(2, 0, 2);
        assert_eq!(w.output_dim(5), Ok(2));
        assert!(matches!(
            w.exact_output_dim(5),
            Err(NetError::InvalidOutputDimension { extent: 5, .. })
        ));
        assert_eq!(w.exact_output_dim(4), Ok(2));
    }

    #[test]
    fn oversized_window_has_no_output() {
        let w = Window::new(4, 0, 1);
        assert!(w.output_dim(3).is_err());
        assert_eq!(Window::new(4, 1, 1).output_dim(3), Ok(2));
    }

    #[test]
    fn im2col_orders_columns_spatial_major() {
        // two samples, one channel, 2x2 image, 1x1 window
        let x = arange(vec![2, 1, 2, 2]);
        let cols = im2col(&x, Window::new(1, 0, 1)).unwrap();
        assert_eq!(cols.shape, vec![1, 8]);
        assert_eq!(cols.data, vec![0.0, 4.0, 1.0, 5.0, 2.0, 6.0, 3.0, 7.0]);
    }

    #[test]
    fn im2col_reads_zero_from_padding() {
        let x = Tensor::new(vec![1, 1, 1, 1], vec![3.0]);
        let cols = im2col(&x, Window::new(3, 1, 1)).unwrap();
        assert_eq!(cols.shape, vec![9, 1]);
        let mut expected = vec![0.0; 9];
        expected[4] = 3.0;
        assert_eq!(cols.data, expected);
    }

    #[test]
    fn col2im_sums_overlapping_windows() {
        let window = Window::new(2, 0, 1);
        let shape = [1, 1, 3, 3];
        let cols = Tensor::new(vec![4, 4], vec![1.0; 16]);
        let img = col2im(&cols, shape, window).unwrap();
        // corners are covered once, edges twice, the center four times
        assert_eq!(
            img.data,
            vec![1.0, 2.0, 1.0, 2.0, 4.0, 2.0, 1.0, 2.0, 1.0]
        );
    }

    #[test]
    fn col2im_is_adjoint_of_im2col() {
        // <im2col(x), y> == <x, col2im(y)>
        let window = Window::new(3, 1, 2);
        let x = arange(vec![2, 2, 5, 4]);
        let cols = im2col(&x, window).unwrap();
        let y = Tensor::new(
            cols.shape.clone(),
            (0..cols.len()).map(|i| ((i * 7) % 11) as f64 - 5.0).collect(),
        );
        let back = col2im(&y, [2, 2, 5, 4], window).unwrap();

        let lhs: f64 = cols.data.iter().zip(&y.data).map(|(a, b)| a * b).sum();
        let rhs: f64 = x.data.iter().zip(&back.data).map(|(a, b)| a * b).sum();
        assert!((lhs - rhs).abs() < 1e-9);
    }

    #[test]
    fn col2im_rejects_wrong_column_shape() {
        let cols = Ten64::zeros(vec![3, 3]);
        let err = col2im(&cols, [1, 1, 3, 3], Window::new(2, 0, 1)).unwrap_err();
        assert!(matches!(err, NetError::ShapeMismatch { op: "col2im", .. }));
    }
}
