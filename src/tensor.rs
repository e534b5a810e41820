// src/tensor.rs
// Dense tensor type backing the network's forward evaluation.
// Wraps ndarray's dynamic-dimension array and provides the handful of
// CPU kernels the architecture needs: conv2d (im2col + GEMM), windowed
// pooling, matrix multiplication and channel-axis concatenation.

use ndarray::{ArrayD, Axis, Ix2, IxDyn};
use rand_distr::num_traits::{Float, FromPrimitive};

/// Scalar element type for tensors.
///
/// Combines the ndarray traits needed for GEMM (`LinalgScalar`) and
/// scalar broadcasting (`ScalarOperand`) with the float behavior needed
/// by the normalization and activation math. The float traits come from
/// the `num_traits` re-export inside `rand_distr`, which is already in
/// the dependency tree for weight initialization.
pub trait Scalar:
    ndarray::LinalgScalar + ndarray::ScalarOperand + Float + FromPrimitive + std::fmt::Debug
{
}

impl Scalar for f32 {}
impl Scalar for f64 {}

/// A dense multi-dimensional array of floating-point values.
///
/// Network tensors are 4-dimensional `[batch, channels, height, width]`
/// until the classifier head flattens them to `[batch, features]`. All
/// kernels validate ranks and dimensions and report mismatches as
/// `Err`; nothing here attempts recovery.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<T>
where
    T: Scalar,
{
    data: ArrayD<T>,
}

impl<T> Tensor<T>
where
    T: Scalar,
{
    /// Wrap an existing ndarray array.
    pub fn new(data: ArrayD<T>) -> Self {
        Self { data }
    }

    /// Create a tensor from a flat vector and a shape.
    pub fn from_vec(data: Vec<T>, shape: &[usize]) -> Result<Self, String> {
        ArrayD::from_shape_vec(IxDyn(shape), data)
            .map(Self::new)
            .map_err(|e| format!("Failed to create tensor with shape {shape:?}: {e}"))
    }

    /// Create a tensor filled with zeros.
    pub fn zeros(shape: &[usize]) -> Self {
        Self::new(ArrayD::zeros(IxDyn(shape)))
    }

    /// Create a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), T::one()))
    }

    /// Create a tensor filled with a constant value.
    pub fn full(shape: &[usize], value: T) -> Self {
        Self::new(ArrayD::from_elem(IxDyn(shape), value))
    }

    /// Shape of the tensor.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Total number of elements.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Borrow the underlying ndarray array.
    pub fn data(&self) -> &ArrayD<T> {
        &self.data
    }

    /// Consume the tensor and return the underlying array.
    pub fn into_data(self) -> ArrayD<T> {
        self.data
    }

    /// Apply a function element-wise, producing a tensor of the same shape.
    pub fn map<F>(&self, f: F) -> Self
    where
        F: Fn(T) -> T,
    {
        Self::new(self.data.mapv(f))
    }

    /// Element-wise addition. Shapes must match exactly.
    pub fn add(&self, other: &Self) -> Result<Self, String> {
        if self.shape() != other.shape() {
            return Err(format!(
                "Shape mismatch in add: {:?} vs {:?}",
                self.shape(),
                other.shape()
            ));
        }
        Ok(Self::new(&self.data + &other.data))
    }

    /// Element-wise (Hadamard) product. Shapes must match exactly.
    pub fn mul(&self, other: &Self) -> Result<Self, String> {
        if self.shape() != other.shape() {
            return Err(format!(
                "Shape mismatch in mul: {:?} vs {:?}",
                self.shape(),
                other.shape()
            ));
        }
        Ok(Self::new(&self.data * &other.data))
    }

    /// Multiply every element by a scalar.
    pub fn mul_scalar(&self, scalar: T) -> Self {
        Self::new(&self.data * scalar)
    }

    /// Matrix multiplication of two 2-D tensors.
    pub fn matmul(&self, other: &Self) -> Result<Self, String> {
        let lhs = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| format!("Matmul lhs must be 2D: {e}"))?;
        let rhs = other
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| format!("Matmul rhs must be 2D: {e}"))?;

        if lhs.ncols() != rhs.nrows() {
            return Err(format!(
                "Matmul dimension mismatch: {:?} vs {:?}",
                self.shape(),
                other.shape()
            ));
        }

        Ok(Self::new(lhs.dot(&rhs).into_dyn()))
    }

    /// Transpose of a 2-D tensor.
    pub fn transpose2d(&self) -> Result<Self, String> {
        let view = self
            .data
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|e| format!("Transpose requires a 2D tensor: {e}"))?;
        Ok(Self::new(view.t().to_owned().into_dyn()))
    }

    /// Concatenate tensors along an axis. All other dimensions must agree.
    pub fn concat(parts: &[&Self], axis: usize) -> Result<Self, String> {
        if parts.is_empty() {
            return Err("Cannot concatenate an empty list of tensors".to_string());
        }
        let views: Vec<_> = parts.iter().map(|t| t.data.view()).collect();
        ndarray::concatenate(Axis(axis), &views)
            .map(Self::new)
            .map_err(|e| format!("Concatenation along axis {axis} failed: {e}"))
    }

    /// Flatten all dimensions after the batch dimension: `[n, ...] -> [n, prod]`.
    pub fn flatten_batch(&self) -> Result<Self, String> {
        if self.ndim() < 2 {
            return Err(format!(
                "Flatten requires at least 2D input, got shape {:?}",
                self.shape()
            ));
        }
        let batch = self.shape()[0];
        let features: usize = self.shape()[1..].iter().product();
        self.data
            .as_standard_layout()
            .to_owned()
            .into_shape_with_order(IxDyn(&[batch, features]))
            .map(Self::new)
            .map_err(|e| format!("Flatten reshape failed: {e}"))
    }
}

/// Output spatial extent of a windowed operation, or an error when the
/// window does not fit the padded input.
fn window_output(
    input: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
) -> Result<usize, String> {
    let padded = input + 2 * padding;
    if padded < kernel {
        return Err(format!(
            "Window of size {kernel} does not fit input extent {input} with padding {padding}"
        ));
    }
    Ok((padded - kernel) / stride + 1)
}

// Convolution kernel: im2col transformation followed by a single GEMM.

impl<T> Tensor<T>
where
    T: Scalar,
{
    /// Rearrange image patches into a `[in_c * kh * kw, batch * out_h * out_w]`
    /// column matrix so the convolution reduces to one matrix product.
    fn im2col(
        &self,
        kernel: (usize, usize),
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<ArrayD<T>, String> {
        let shape = self.shape();
        let (batch, channels, in_h, in_w) = (shape[0], shape[1], shape[2], shape[3]);
        let (kernel_h, kernel_w) = kernel;

        let out_h = window_output(in_h, kernel_h, stride.0, padding.0)?;
        let out_w = window_output(in_w, kernel_w, stride.1, padding.1)?;

        let col_height = channels * kernel_h * kernel_w;
        let col_width = batch * out_h * out_w;
        let mut col_data = vec![T::zero(); col_height * col_width];

        let input = self.data.as_standard_layout();
        let input_slice = input.as_slice().ok_or("Input data not contiguous")?;

        for b in 0..batch {
            for c in 0..channels {
                for ky in 0..kernel_h {
                    for kx in 0..kernel_w {
                        let col_row = c * kernel_h * kernel_w + ky * kernel_w + kx;

                        for out_y in 0..out_h {
                            for out_x in 0..out_w {
                                let in_y = (out_y * stride.0 + ky) as i32 - padding.0 as i32;
                                let in_x = (out_x * stride.1 + kx) as i32 - padding.1 as i32;
                                // Positions inside the zero padding keep their zero fill.
                                if in_y >= 0
                                    && in_y < in_h as i32
                                    && in_x >= 0
                                    && in_x < in_w as i32
                                {
                                    let input_idx = b * (channels * in_h * in_w)
                                        + c * (in_h * in_w)
                                        + (in_y as usize) * in_w
                                        + in_x as usize;
                                    let col_col = b * (out_h * out_w) + out_y * out_w + out_x;
                                    col_data[col_row * col_width + col_col] =
                                        input_slice[input_idx];
                                }
                            }
                        }
                    }
                }
            }
        }

        ArrayD::from_shape_vec(IxDyn(&[col_height, col_width]), col_data)
            .map_err(|e| format!("Failed to create im2col matrix: {e}"))
    }

    /// 2D convolution with a `[out_c, in_c, kh, kw]` filter.
    ///
    /// Input shape `[batch, in_c, h, w]`, output shape
    /// `[batch, out_c, (h + 2p - kh) / s + 1, (w + 2p - kw) / s + 1]`.
    pub fn conv2d(
        &self,
        filter: &Self,
        stride: (usize, usize),
        padding: (usize, usize),
    ) -> Result<Self, String> {
        if self.ndim() != 4 {
            return Err(format!(
                "Conv2d requires 4D input [batch, channels, height, width], got shape {:?}",
                self.shape()
            ));
        }
        if filter.ndim() != 4 {
            return Err(format!(
                "Conv2d filter must be 4D [out_c, in_c, kh, kw], got shape {:?}",
                filter.shape()
            ));
        }

        let input_shape = self.shape();
        let filter_shape = filter.shape();
        let (batch, in_channels, in_h, in_w) = (
            input_shape[0],
            input_shape[1],
            input_shape[2],
            input_shape[3],
        );
        let (out_channels, filter_in, kernel_h, kernel_w) = (
            filter_shape[0],
            filter_shape[1],
            filter_shape[2],
            filter_shape[3],
        );

        if in_channels != filter_in {
            return Err(format!(
                "Input channels {in_channels} don't match filter channels {filter_in}"
            ));
        }

        let out_h = window_output(in_h, kernel_h, stride.0, padding.0)?;
        let out_w = window_output(in_w, kernel_w, stride.1, padding.1)?;

        let col_matrix = self.im2col((kernel_h, kernel_w), stride, padding)?;

        let filter_matrix = filter
            .data
            .as_standard_layout()
            .to_owned()
            .into_shape_with_order(IxDyn(&[out_channels, in_channels * kernel_h * kernel_w]))
            .map_err(|e| format!("Filter reshape failed: {e}"))?;

        // Convolution as matrix multiplication: filter @ col_matrix.
        let col_view: ndarray::ArrayView2<T> = col_matrix
            .view()
            .into_dimensionality()
            .map_err(|e| format!("Shape error: {e}"))?;
        let filter_view: ndarray::ArrayView2<T> = filter_matrix
            .view()
            .into_dimensionality()
            .map_err(|e| format!("Shape error: {e}"))?;
        let output_2d = filter_view.dot(&col_view);

        // Reorder [out_c, batch * out_h * out_w] into [batch, out_c, out_h, out_w].
        let output_slice = output_2d
            .as_slice()
            .ok_or("Failed to get contiguous output data")?;
        let mut output = vec![T::zero(); batch * out_channels * out_h * out_w];
        let plane = out_h * out_w;
        for out_c in 0..out_channels {
            for b in 0..batch {
                let src = out_c * (batch * plane) + b * plane;
                let dst = b * (out_channels * plane) + out_c * plane;
                output[dst..dst + plane].copy_from_slice(&output_slice[src..src + plane]);
            }
        }

        Self::from_vec(output, &[batch, out_channels, out_h, out_w])
    }
}

// Pooling kernels. Max and average pooling share a single windowed
// traversal, parameterized by the accumulation behavior.

trait PoolOp<T: Scalar> {
    fn init() -> T;
    fn accumulate(accumulator: &mut T, value: T, valid_count: &mut usize);
    fn finalize(accumulator: T, valid_count: usize) -> T;
}

struct MaxPoolOp;

impl<T: Scalar> PoolOp<T> for MaxPoolOp {
    fn init() -> T {
        T::neg_infinity()
    }

    fn accumulate(accumulator: &mut T, value: T, _valid_count: &mut usize) {
        if value > *accumulator {
            *accumulator = value;
        }
    }

    fn finalize(accumulator: T, _valid_count: usize) -> T {
        accumulator
    }
}

struct AvgPoolOp;

impl<T: Scalar> PoolOp<T> for AvgPoolOp {
    fn init() -> T {
        T::zero()
    }

    fn accumulate(accumulator: &mut T, value: T, valid_count: &mut usize) {
        *accumulator = *accumulator + value;
        *valid_count += 1;
    }

    fn finalize(accumulator: T, valid_count: usize) -> T {
        if valid_count > 0 {
            accumulator / T::from_usize(valid_count).unwrap_or_else(T::one)
        } else {
            T::zero()
        }
    }
}

impl<T> Tensor<T>
where
    T: Scalar,
{
    /// Shared windowed pooling traversal over `[n, c, h, w]` input.
    /// Padded positions never enter the accumulator, so max pooling
    /// ignores them and average pooling divides by the valid count.
    fn pool2d<Op: PoolOp<T>>(
        &self,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Self, String> {
        if self.ndim() != 4 {
            return Err(format!(
                "Pooling requires 4D input [batch, channels, height, width], got shape {:?}",
                self.shape()
            ));
        }

        let shape = self.shape();
        let (n, c, h, w) = (shape[0], shape[1], shape[2], shape[3]);
        let h_out = window_output(h, kernel_size, stride, padding)?;
        let w_out = window_output(w, kernel_size, stride, padding)?;

        let input = self.data.as_standard_layout();
        let input_slice = input.as_slice().ok_or("Input data not contiguous")?;

        let mut output = vec![T::zero(); n * c * h_out * w_out];

        for batch in 0..n {
            for channel in 0..c {
                for out_y in 0..h_out {
                    for out_x in 0..w_out {
                        let h_start = (out_y * stride) as i32 - padding as i32;
                        let w_start = (out_x * stride) as i32 - padding as i32;

                        let mut accumulator = Op::init();
                        let mut valid_count = 0;

                        for ky in 0..kernel_size {
                            for kx in 0..kernel_size {
                                let h_pos = h_start + ky as i32;
                                let w_pos = w_start + kx as i32;
                                if h_pos >= 0
                                    && h_pos < h as i32
                                    && w_pos >= 0
                                    && w_pos < w as i32
                                {
                                    let input_idx = batch * (c * h * w)
                                        + channel * (h * w)
                                        + (h_pos as usize) * w
                                        + w_pos as usize;
                                    Op::accumulate(
                                        &mut accumulator,
                                        input_slice[input_idx],
                                        &mut valid_count,
                                    );
                                }
                            }
                        }

                        let output_idx = batch * (c * h_out * w_out)
                            + channel * (h_out * w_out)
                            + out_y * w_out
                            + out_x;
                        output[output_idx] = Op::finalize(accumulator, valid_count);
                    }
                }
            }
        }

        Self::from_vec(output, &[n, c, h_out, w_out])
    }

    /// 2D max pooling with a square window.
    pub fn maxpool2d(
        &self,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Self, String> {
        self.pool2d::<MaxPoolOp>(kernel_size, stride, padding)
    }

    /// 2D average pooling with a square window.
    pub fn avgpool2d(
        &self,
        kernel_size: usize,
        stride: usize,
        padding: usize,
    ) -> Result<Self, String> {
        self.pool2d::<AvgPoolOp>(kernel_size, stride, padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn from_vec_rejects_mismatched_shape() {
        let result = Tensor::<f32>::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]);
        assert!(result.is_err());
    }

    #[test]
    fn conv2d_known_values() {
        // 1x1x3x3 input, 1x1x2x2 filter of ones: each output is a window sum.
        let input = Tensor::<f32>::from_vec(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
            &[1, 1, 3, 3],
        )
        .unwrap();
        let filter = Tensor::<f32>::ones(&[1, 1, 2, 2]);

        let output = input.conv2d(&filter, (1, 1), (0, 0)).unwrap();
        assert_eq!(output.shape(), &[1, 1, 2, 2]);

        let expected = [12.0, 16.0, 24.0, 28.0];
        for (got, want) in output.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn conv2d_stride_and_padding() {
        // 7x7 conv with stride 2 and padding 3, the stem configuration.
        let input = Tensor::<f32>::ones(&[1, 3, 16, 16]);
        let filter = Tensor::<f32>::ones(&[4, 3, 7, 7]);

        let output = input.conv2d(&filter, (2, 2), (3, 3)).unwrap();
        assert_eq!(output.shape(), &[1, 4, 8, 8]);

        // Center positions see the whole 3-channel 7x7 window of ones.
        let center = output.data()[[0, 0, 4, 4]];
        assert_relative_eq!(center, 3.0 * 49.0, epsilon = 1e-4);
    }

    #[test]
    fn conv2d_rejects_channel_mismatch() {
        let input = Tensor::<f32>::ones(&[1, 3, 8, 8]);
        let filter = Tensor::<f32>::ones(&[4, 5, 3, 3]);
        assert!(input.conv2d(&filter, (1, 1), (1, 1)).is_err());
    }

    #[test]
    fn maxpool2d_known_values() {
        let input = Tensor::<f32>::from_vec(
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
                16.0,
            ],
            &[1, 1, 4, 4],
        )
        .unwrap();

        let output = input.maxpool2d(2, 2, 0).unwrap();
        assert_eq!(output.shape(), &[1, 1, 2, 2]);
        let expected = [6.0, 8.0, 14.0, 16.0];
        for (got, want) in output.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn maxpool2d_padded_stride_two_halves_extent() {
        // The network's shared pool: kernel 3, stride 2, padding 1.
        let input = Tensor::<f32>::ones(&[2, 3, 28, 28]);
        let output = input.maxpool2d(3, 2, 1).unwrap();
        assert_eq!(output.shape(), &[2, 3, 14, 14]);
        // Padded positions are ignored, so corners still see real input.
        assert_relative_eq!(output.data()[[0, 0, 0, 0]], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn avgpool2d_known_values() {
        let input = Tensor::<f32>::from_vec(
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0,
                16.0,
            ],
            &[1, 1, 4, 4],
        )
        .unwrap();

        let output = input.avgpool2d(2, 2, 0).unwrap();
        let expected = [3.5, 5.5, 11.5, 13.5];
        for (got, want) in output.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn pool_rejects_oversized_window() {
        let input = Tensor::<f32>::ones(&[1, 1, 4, 4]);
        assert!(input.avgpool2d(7, 1, 0).is_err());
    }

    #[test]
    fn concat_along_channel_axis() {
        let a = Tensor::<f32>::ones(&[2, 3, 4, 4]);
        let b = Tensor::<f32>::zeros(&[2, 5, 4, 4]);

        let joined = Tensor::concat(&[&a, &b], 1).unwrap();
        assert_eq!(joined.shape(), &[2, 8, 4, 4]);
        assert_relative_eq!(joined.data()[[0, 0, 0, 0]], 1.0);
        assert_relative_eq!(joined.data()[[0, 3, 0, 0]], 0.0);
    }

    #[test]
    fn concat_rejects_spatial_mismatch() {
        let a = Tensor::<f32>::ones(&[2, 3, 4, 4]);
        let b = Tensor::<f32>::ones(&[2, 3, 5, 5]);
        assert!(Tensor::concat(&[&a, &b], 1).is_err());
    }

    #[test]
    fn matmul_known_values() {
        let a = Tensor::<f64>::from_vec(vec![1.0, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        let b = Tensor::<f64>::from_vec(vec![5.0, 6.0, 7.0, 8.0], &[2, 2]).unwrap();

        let c = a.matmul(&b).unwrap();
        let expected = [19.0, 22.0, 43.0, 50.0];
        for (got, want) in c.data().iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
    }

    #[test]
    fn flatten_batch_preserves_batch_dimension() {
        let input = Tensor::<f32>::ones(&[2, 3, 4, 5]);
        let flat = input.flatten_batch().unwrap();
        assert_eq!(flat.shape(), &[2, 60]);
    }
}
