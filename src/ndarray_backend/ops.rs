use half::{bf16, f16};
use ndarray::linalg::general_mat_mul;
use ndarray::{ArcArray, Array, ArrayView2, ArrayViewD, ArrayViewMut2, Axis, IxDyn, Zip, s};
use num_traits::{One, WrappingAdd, WrappingMul, Zero};

#[derive(Debug, thiserror::Error)]
pub enum NDArrayOperationError {
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
    #[error("shape mismatch: {0:?} vs {1:?}")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub(crate) enum NativeBinaryOperation {
    Add,
    Mul,
}

/// Element arithmetic used by the native kernels. Integer types wrap on
/// overflow, matching numpy.
pub(crate) trait NativeArithmetic: Copy + Zero {
    fn native_add(self, rhs: Self) -> Self;
    fn native_mul(self, rhs: Self) -> Self;

    /// `c = a · b` for one matrix pair.
    fn mat_mul_into(a: &ArrayView2<'_, Self>, b: &ArrayView2<'_, Self>, c: &mut ArrayViewMut2<'_, Self>) {
        for ((i, j), out) in c.indexed_iter_mut() {
            let mut acc = Self::zero();
            for k in 0..a.ncols() {
                acc = acc.native_add(a[[i, k]].native_mul(b[[k, j]]));
            }
            *out = acc;
        }
    }
}

macro_rules! impl_native_arithmetic {
    (gemm: $($t:ty),*) => {$(
        impl NativeArithmetic for $t {
            fn native_add(self, rhs: Self) -> Self {
                self + rhs
            }

            fn native_mul(self, rhs: Self) -> Self {
                self * rhs
            }

            fn mat_mul_into(a: &ArrayView2<'_, Self>, b: &ArrayView2<'_, Self>, c: &mut ArrayViewMut2<'_, Self>) {
                general_mat_mul(<$t>::one(), a, b, <$t>::zero(), c);
            }
        }
    )*};
    (float: $($t:ty),*) => {$(
        impl NativeArithmetic for $t {
            fn native_add(self, rhs: Self) -> Self {
                self + rhs
            }

            fn native_mul(self, rhs: Self) -> Self {
                self * rhs
            }
        }
    )*};
    (wrapping: $($t:ty),*) => {$(
        impl NativeArithmetic for $t {
            fn native_add(self, rhs: Self) -> Self {
                WrappingAdd::wrapping_add(&self, &rhs)
            }

            fn native_mul(self, rhs: Self) -> Self {
                WrappingMul::wrapping_mul(&self, &rhs)
            }
        }
    )*};
}

impl_native_arithmetic!(gemm: f64, f32);
impl_native_arithmetic!(float: bf16, f16);
impl_native_arithmetic!(wrapping: i64, i32);

/// Numpy-style multidirectional broadcasting of two shapes.
pub(crate) fn broadcast_shapes(a: &[usize], b: &[usize]) -> Result<Vec<usize>, NDArrayOperationError> {
    let rank = a.len().max(b.len());
    let mut output_dims = Vec::with_capacity(rank);
    for i in 0..rank {
        // Missing leading dims count as 1
        let ad = (i + a.len()).checked_sub(rank).map_or(1, |j| a[j]);
        let bd = (i + b.len()).checked_sub(rank).map_or(1, |j| b[j]);
        output_dims.push(match (ad, bd) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            _ => return Err(NDArrayOperationError::ShapeMismatch(a.to_vec(), b.to_vec())),
        });
    }
    Ok(output_dims)
}

impl NativeBinaryOperation {
    pub(crate) fn apply<T>(
        &self,
        a: &ArcArray<T, IxDyn>,
        b: &ArcArray<T, IxDyn>,
    ) -> Result<ArcArray<T, IxDyn>, NDArrayOperationError>
    where
        T: NativeArithmetic,
    {
        let shape = broadcast_shapes(a.shape(), b.shape())?;
        let mismatch = || NDArrayOperationError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec());
        let a_view = a.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;
        let b_view = b.broadcast(IxDyn(&shape)).ok_or_else(mismatch)?;

        let zip = Zip::from(&a_view).and(&b_view);
        let o: Array<T, IxDyn> = match self {
            NativeBinaryOperation::Add => zip.map_collect(|&a, &b| a.native_add(b)),
            NativeBinaryOperation::Mul => zip.map_collect(|&a, &b| a.native_mul(b)),
        };
        Ok(o.into_shared())
    }
}

/// Matrix product with numpy `matmul` semantics: 1-D operands are promoted to
/// matrices and leading batch dimensions broadcast against each other.
pub(crate) fn matmul<T>(
    a: &ArcArray<T, IxDyn>,
    b: &ArcArray<T, IxDyn>,
) -> Result<ArcArray<T, IxDyn>, NDArrayOperationError>
where
    T: NativeArithmetic,
{
    let mismatch = || NDArrayOperationError::ShapeMismatch(a.shape().to_vec(), b.shape().to_vec());
    if a.ndim() == 0 || b.ndim() == 0 {
        return Err(mismatch());
    }

    let mut a_view: ArrayViewD<'_, T> = a.view();
    let mut b_view: ArrayViewD<'_, T> = b.view();

    let mut drop_row_axis_after = false;
    let mut drop_col_axis_after = false;

    if a_view.ndim() == 1 {
        // [K] -> [1, K]
        a_view = a_view.insert_axis(Axis(0));
        drop_row_axis_after = true;
    }
    if b_view.ndim() == 1 {
        // [K] -> [K, 1]
        b_view = b_view.insert_axis(Axis(1));
        drop_col_axis_after = true;
    }

    let rank = a_view.ndim().max(b_view.ndim());
    while a_view.ndim() < rank {
        a_view = a_view.insert_axis(Axis(0));
    }
    while b_view.ndim() < rank {
        b_view = b_view.insert_axis(Axis(0));
    }

    let a_shape = a_view.shape().to_vec();
    let b_shape = b_view.shape().to_vec();

    let batch_shape = broadcast_shapes(&a_shape[..rank - 2], &b_shape[..rank - 2])
        .map_err(|_| mismatch())?;

    let (m, k_left) = (a_shape[rank - 2], a_shape[rank - 1]);
    let (k_right, p) = (b_shape[rank - 2], b_shape[rank - 1]);
    if k_left != k_right {
        return Err(mismatch());
    }

    let batch: usize = batch_shape.iter().product();

    let mut a_bcast_shape = batch_shape.clone();
    a_bcast_shape.extend([m, k_left]);
    let mut b_bcast_shape = batch_shape.clone();
    b_bcast_shape.extend([k_left, p]);

    let a_b = a_view
        .broadcast(IxDyn(&a_bcast_shape))
        .ok_or_else(mismatch)?;
    let a_b = a_b.to_shape((batch, m, k_left))?;
    let b_b = b_view
        .broadcast(IxDyn(&b_bcast_shape))
        .ok_or_else(mismatch)?;
    let b_b = b_b.to_shape((batch, k_left, p))?;

    let mut out = Array::<T, _>::zeros((batch, m, p));
    for i in 0..batch {
        let a_mat: ArrayView2<'_, T> = a_b.slice(s![i, .., ..]);
        let b_mat: ArrayView2<'_, T> = b_b.slice(s![i, .., ..]);
        let mut c: ArrayViewMut2<'_, T> = out.slice_mut(s![i, .., ..]);
        T::mat_mul_into(&a_mat, &b_mat, &mut c);
    }

    let mut final_shape = batch_shape;
    final_shape.extend([m, p]);
    let mut result = out.into_shape_with_order(IxDyn(&final_shape))?;

    if drop_row_axis_after {
        let row_axis = Axis(result.ndim() - 2);
        result = result.index_axis_move(row_axis, 0);
    }
    if drop_col_axis_after {
        let col_axis = Axis(result.ndim() - 1);
        result = result.index_axis_move(col_axis, 0);
    }

    Ok(result.into_shared())
}
