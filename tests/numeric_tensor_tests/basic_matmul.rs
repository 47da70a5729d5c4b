use crate::numeric_tensor_tests::{Evaluator, test_eq_bf16, test_eq_exact, test_eq_f16, test_eq_f32};
use opgraph::NumericTensor;
use opgraph::dtype::DType;

fn shaped(values: Vec<f64>, shape: &[usize], dtype: DType) -> NumericTensor {
    NumericTensor::from_vec(values)
        .reshape(shape)
        .unwrap()
        .cast(dtype)
        .unwrap()
}

fn matmul_2_3(evaluator: &Evaluator, dtype: DType) -> (NumericTensor, NumericTensor) {
    let tensor_a = shaped(vec![1.0, -2.5, 3.0, 4.0, 0.5, -1.0], &[2, 3], dtype);
    let tensor_b = shaped(vec![1.0, 2.0, 0.25, -0.75, 3.5, 0.0], &[3, 2], dtype);
    let result = evaluator.matmul(&tensor_a, &tensor_b).unwrap();
    let correct = shaped(vec![10.875, 3.875, 0.625, 7.625], &[2, 2], dtype);
    (result, correct)
}

pub fn test_matmul_2_3_bf16(evaluator: &Evaluator) {
    let (result, correct) = matmul_2_3(evaluator, DType::BF16);
    test_eq_bf16(result, correct);
}

pub fn test_matmul_2_3_f16(evaluator: &Evaluator) {
    let (result, correct) = matmul_2_3(evaluator, DType::F16);
    test_eq_f16(result, correct);
}

pub fn test_matmul_2_3_fp32(evaluator: &Evaluator) {
    let (result, correct) = matmul_2_3(evaluator, DType::F32);
    test_eq_f32(result, correct);
}

pub fn test_matmul_identity_i64(evaluator: &Evaluator) {
    let identity = NumericTensor::from_rows(vec![vec![1i64, 0], vec![0, 1]]).unwrap();
    let tensor_b = NumericTensor::from_rows(vec![vec![5i64, -6], vec![7, 8]]).unwrap();
    let result = evaluator.matmul(&identity, &tensor_b).unwrap();
    test_eq_exact(result, tensor_b);
}

pub fn test_matmul_1_4_4_1_fp32(evaluator: &Evaluator) {
    let tensor_a = shaped(vec![1.0, 2.0, 3.0, 4.0], &[1, 4], DType::F32);
    let tensor_b = shaped(vec![0.5, -1.0, 2.0, 0.25], &[4, 1], DType::F32);
    let result = evaluator.matmul(&tensor_a, &tensor_b).unwrap();
    test_eq_f32(result, shaped(vec![5.5], &[1, 1], DType::F32));
}

pub fn test_matmul_4_1_1_4_fp32(evaluator: &Evaluator) {
    let tensor_a = shaped(vec![1.0, 2.0, 3.0, 4.0], &[4, 1], DType::F32);
    let tensor_b = shaped(vec![1.0, -1.0, 0.5, 2.0], &[1, 4], DType::F32);
    let result = evaluator.matmul(&tensor_a, &tensor_b).unwrap();
    #[rustfmt::skip]
    let correct = shaped(vec![
        1.0, -1.0, 0.5, 2.0,
        2.0, -2.0, 1.0, 4.0,
        3.0, -3.0, 1.5, 6.0,
        4.0, -4.0, 2.0, 8.0,
    ], &[4, 4], DType::F32);
    test_eq_f32(result, correct);
}

pub fn test_matmul_matrix_vector_f64(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_rows(vec![vec![10.0f64, 20.0]]).unwrap();
    let tensor_x = NumericTensor::from_vec(vec![10.0f64, 20.0]);
    let result = evaluator.matmul(&tensor_a, &tensor_x).unwrap();
    test_eq_exact(result, NumericTensor::from_vec(vec![500.0f64]));
}

pub fn test_matmul_2_2_2_2_fp32(evaluator: &Evaluator) {
    let tensor_a = shaped(vec![1.0, 2.0, 3.0, 4.0, 0.0, 1.0, 1.0, 0.0], &[2, 2, 2], DType::F32);
    let tensor_b = shaped(vec![1.0, 0.0, 0.0, 1.0, 2.0, 0.0, 0.0, 2.0], &[2, 2, 2], DType::F32);
    let result = evaluator.matmul(&tensor_a, &tensor_b).unwrap();
    let correct = shaped(vec![1.0, 2.0, 3.0, 4.0, 0.0, 2.0, 2.0, 0.0], &[2, 2, 2], DType::F32);
    test_eq_f32(result, correct);
}

pub fn test_matmul_inner_dim_mismatch(evaluator: &Evaluator) {
    let tensor_a = shaped(vec![1.0; 6], &[2, 3], DType::F32);
    let tensor_b = shaped(vec![1.0; 4], &[2, 2], DType::F32);
    let err = evaluator.matmul(&tensor_a, &tensor_b).unwrap_err();
    assert!(err.is_shape_mismatch(), "{err}");
}

pub fn test_matmul_overflow_wraps_i64(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_rows(vec![vec![i64::MAX, 1]]).unwrap();
    let tensor_b = NumericTensor::from_rows(vec![vec![1i64], vec![1]]).unwrap();
    let result = evaluator.matmul(&tensor_a, &tensor_b).unwrap();
    test_eq_exact(result, NumericTensor::from_rows(vec![vec![i64::MIN]]).unwrap());
}
