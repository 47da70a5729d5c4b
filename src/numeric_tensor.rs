use crate::dtype::{DType, DTypeError, DTypeOfPrimitive};
use crate::ndarray_backend::NDArrayOperationError;
use crate::ndarray_backend::ops::{self, NativeBinaryOperation};
use half::{bf16, f16};
use ndarray::{ArcArray, Array, IxDyn};
use num_traits::{NumCast, ToPrimitive};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, thiserror::Error)]
pub enum NumericTensorError {
    #[error(transparent)]
    DTypeError(#[from] DTypeError),
    #[error(transparent)]
    NDArrayOperationError(#[from] NDArrayOperationError),
    #[error(transparent)]
    ShapeError(#[from] ndarray::ShapeError),
    #[error("Unsupported operation {0} for dtypes {1:?}")]
    UnsupportedOperationForDTypes(String, Vec<DType>),
    #[error("Rows have differing lengths")]
    RaggedRows,
    #[error("Expected a single element, got shape {0:?}")]
    NotAScalar(Vec<usize>),
}

impl NumericTensorError {
    pub fn is_shape_mismatch(&self) -> bool {
        matches!(
            self,
            NumericTensorError::NDArrayOperationError(NDArrayOperationError::ShapeMismatch(_, _))
        )
    }
}

/// Dynamically ranked and typed value flowing through a graph. A scalar is a
/// rank 0 tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NumericTensor {
    F64(ArcArray<f64, IxDyn>),
    F32(ArcArray<f32, IxDyn>),
    BF16(ArcArray<bf16, IxDyn>),
    F16(ArcArray<f16, IxDyn>),
    I64(ArcArray<i64, IxDyn>),
    I32(ArcArray<i32, IxDyn>),
}

impl Display for NumericTensor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            NumericTensor::F64(x) => x.fmt(f),
            NumericTensor::F32(x) => x.fmt(f),
            NumericTensor::BF16(x) => x.fmt(f),
            NumericTensor::F16(x) => x.fmt(f),
            NumericTensor::I64(x) => x.fmt(f),
            NumericTensor::I32(x) => x.fmt(f),
        }
    }
}

pub trait NumericTensorType: Sized + DTypeOfPrimitive + Clone + Copy + ToPrimitive + NumCast {
    fn numeric_tensor_from_ndarray(value: ArcArray<Self, IxDyn>) -> NumericTensor;
    fn numeric_tensor_inner(tensor: &NumericTensor) -> Result<&ArcArray<Self, IxDyn>, DTypeError>;
}

macro_rules! impl_numeric_tensor_type {
    ($t:ty, $variant:ident) => {
        impl NumericTensorType for $t {
            fn numeric_tensor_from_ndarray(value: ArcArray<Self, IxDyn>) -> NumericTensor {
                NumericTensor::$variant(value)
            }

            fn numeric_tensor_inner(
                tensor: &NumericTensor,
            ) -> Result<&ArcArray<Self, IxDyn>, DTypeError> {
                match tensor {
                    NumericTensor::$variant(x) => Ok(x),
                    _ => Err(DTypeError::DTypeMismatch(DType::$variant, tensor.dtype())),
                }
            }
        }

        impl From<$t> for NumericTensor {
            fn from(value: $t) -> Self {
                NumericTensor::from_scalar(value)
            }
        }
    };
}

impl_numeric_tensor_type!(f64, F64);
impl_numeric_tensor_type!(f32, F32);
impl_numeric_tensor_type!(bf16, BF16);
impl_numeric_tensor_type!(f16, F16);
impl_numeric_tensor_type!(i64, I64);
impl_numeric_tensor_type!(i32, I32);

impl<T: NumericTensorType> From<Vec<T>> for NumericTensor {
    fn from(value: Vec<T>) -> Self {
        NumericTensor::from_vec(value)
    }
}

fn cast_array<A, B>(value: &ArcArray<A, IxDyn>, from: DType) -> Result<ArcArray<B, IxDyn>, NumericTensorError>
where
    A: NumericTensorType,
    B: NumericTensorType,
{
    let v = value
        .iter()
        .map(|x| <B as NumCast>::from(*x))
        .collect::<Option<Vec<B>>>()
        .ok_or(DTypeError::InvalidCast(from, B::DTYPE))?;
    Ok(Array::from_shape_vec(value.raw_dim(), v)?.into_shared())
}

macro_rules! cast_to {
    ($tensor:expr, $t:ty) => {{
        let from = $tensor.dtype();
        match $tensor {
            NumericTensor::F64(x) => cast_array::<f64, $t>(x, from)?,
            NumericTensor::F32(x) => cast_array::<f32, $t>(x, from)?,
            NumericTensor::BF16(x) => cast_array::<bf16, $t>(x, from)?,
            NumericTensor::F16(x) => cast_array::<f16, $t>(x, from)?,
            NumericTensor::I64(x) => cast_array::<i64, $t>(x, from)?,
            NumericTensor::I32(x) => cast_array::<i32, $t>(x, from)?,
        }
    }};
}

impl NumericTensor {
    pub fn from_scalar<T: NumericTensorType>(value: T) -> Self {
        T::numeric_tensor_from_ndarray(ArcArray::from_elem(IxDyn(&[]), value))
    }

    pub fn from_vec<T: NumericTensorType>(v: Vec<T>) -> Self {
        T::numeric_tensor_from_ndarray(ArcArray::from_vec(v).into_dyn())
    }

    pub fn from_vec_shape<T: NumericTensorType>(
        v: Vec<T>,
        shape: &[usize],
    ) -> Result<Self, NumericTensorError> {
        Ok(T::numeric_tensor_from_ndarray(ArcArray::from_shape_vec(
            IxDyn(shape),
            v,
        )?))
    }

    /// Builds a rank 2 tensor from row-major nested rows.
    pub fn from_rows<T: NumericTensorType>(rows: Vec<Vec<T>>) -> Result<Self, NumericTensorError> {
        let n_cols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != n_cols) {
            return Err(NumericTensorError::RaggedRows);
        }
        let n_rows = rows.len();
        let flat = rows.into_iter().flatten().collect();
        Self::from_vec_shape(flat, &[n_rows, n_cols])
    }

    pub fn dtype(&self) -> DType {
        match self {
            NumericTensor::F64(_) => DType::F64,
            NumericTensor::F32(_) => DType::F32,
            NumericTensor::BF16(_) => DType::BF16,
            NumericTensor::F16(_) => DType::F16,
            NumericTensor::I64(_) => DType::I64,
            NumericTensor::I32(_) => DType::I32,
        }
    }

    pub fn shape(&self) -> Vec<usize> {
        match self {
            NumericTensor::F64(x) => x.shape().to_vec(),
            NumericTensor::F32(x) => x.shape().to_vec(),
            NumericTensor::BF16(x) => x.shape().to_vec(),
            NumericTensor::F16(x) => x.shape().to_vec(),
            NumericTensor::I64(x) => x.shape().to_vec(),
            NumericTensor::I32(x) => x.shape().to_vec(),
        }
    }

    pub fn rank(&self) -> usize {
        self.shape().len()
    }

    pub fn num_elements(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn as_inner<T: NumericTensorType>(&self) -> Result<&ArcArray<T, IxDyn>, NumericTensorError> {
        Ok(T::numeric_tensor_inner(self)?)
    }

    /// Flattened elements in logical (row-major) order.
    pub fn to_flat_vec<T: NumericTensorType>(&self) -> Result<Vec<T>, NumericTensorError> {
        Ok(self.as_inner::<T>()?.iter().cloned().collect())
    }

    pub fn to_scalar<T: NumericTensorType>(&self) -> Result<T, NumericTensorError> {
        let inner = self.as_inner::<T>()?;
        match inner.iter().next() {
            Some(x) if inner.len() == 1 => Ok(*x),
            _ => Err(NumericTensorError::NotAScalar(self.shape())),
        }
    }

    pub fn reshape(&self, shape: &[usize]) -> Result<Self, NumericTensorError> {
        Ok(match self {
            NumericTensor::F64(x) => NumericTensor::F64(x.to_shape(IxDyn(shape))?.to_shared()),
            NumericTensor::F32(x) => NumericTensor::F32(x.to_shape(IxDyn(shape))?.to_shared()),
            NumericTensor::BF16(x) => NumericTensor::BF16(x.to_shape(IxDyn(shape))?.to_shared()),
            NumericTensor::F16(x) => NumericTensor::F16(x.to_shape(IxDyn(shape))?.to_shared()),
            NumericTensor::I64(x) => NumericTensor::I64(x.to_shape(IxDyn(shape))?.to_shared()),
            NumericTensor::I32(x) => NumericTensor::I32(x.to_shape(IxDyn(shape))?.to_shared()),
        })
    }

    pub fn cast(&self, dtype: DType) -> Result<Self, NumericTensorError> {
        if self.dtype() == dtype {
            return Ok(self.clone());
        }
        Ok(match dtype {
            DType::F64 => NumericTensor::F64(cast_to!(self, f64)),
            DType::F32 => NumericTensor::F32(cast_to!(self, f32)),
            DType::BF16 => NumericTensor::BF16(cast_to!(self, bf16)),
            DType::F16 => NumericTensor::F16(cast_to!(self, f16)),
            DType::I64 => NumericTensor::I64(cast_to!(self, i64)),
            DType::I32 => NumericTensor::I32(cast_to!(self, i32)),
        })
    }

    fn try_binary_op(a: &Self, b: &Self, op: NativeBinaryOperation) -> Result<Self, NumericTensorError> {
        Ok(match (a, b) {
            (NumericTensor::F64(x), NumericTensor::F64(y)) => NumericTensor::F64(op.apply(x, y)?),
            (NumericTensor::F32(x), NumericTensor::F32(y)) => NumericTensor::F32(op.apply(x, y)?),
            (NumericTensor::BF16(x), NumericTensor::BF16(y)) => NumericTensor::BF16(op.apply(x, y)?),
            (NumericTensor::F16(x), NumericTensor::F16(y)) => NumericTensor::F16(op.apply(x, y)?),
            (NumericTensor::I64(x), NumericTensor::I64(y)) => NumericTensor::I64(op.apply(x, y)?),
            (NumericTensor::I32(x), NumericTensor::I32(y)) => NumericTensor::I32(op.apply(x, y)?),
            _ => {
                return Err(NumericTensorError::UnsupportedOperationForDTypes(
                    op.to_string(),
                    vec![a.dtype(), b.dtype()],
                ));
            }
        })
    }

    pub fn add(a: &Self, b: &Self) -> Result<Self, NumericTensorError> {
        Self::try_binary_op(a, b, NativeBinaryOperation::Add)
    }

    pub fn mul(a: &Self, b: &Self) -> Result<Self, NumericTensorError> {
        Self::try_binary_op(a, b, NativeBinaryOperation::Mul)
    }

    /// Half precision inputs are accumulated in F32 and cast back.
    pub fn matmul(a: &Self, b: &Self) -> Result<Self, NumericTensorError> {
        Ok(match (a, b) {
            (NumericTensor::F64(x), NumericTensor::F64(y)) => NumericTensor::F64(ops::matmul(x, y)?),
            (NumericTensor::F32(x), NumericTensor::F32(y)) => NumericTensor::F32(ops::matmul(x, y)?),
            (NumericTensor::I64(x), NumericTensor::I64(y)) => NumericTensor::I64(ops::matmul(x, y)?),
            (NumericTensor::I32(x), NumericTensor::I32(y)) => NumericTensor::I32(ops::matmul(x, y)?),
            (NumericTensor::BF16(_), NumericTensor::BF16(_))
            | (NumericTensor::F16(_), NumericTensor::F16(_)) => {
                let out = Self::matmul(&a.cast(DType::F32)?, &b.cast(DType::F32)?)?;
                out.cast(a.dtype())?
            }
            _ => {
                return Err(NumericTensorError::UnsupportedOperationForDTypes(
                    "MatMul".to_string(),
                    vec![a.dtype(), b.dtype()],
                ));
            }
        })
    }
}
