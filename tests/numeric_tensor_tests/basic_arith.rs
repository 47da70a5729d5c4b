use crate::numeric_tensor_tests::{Evaluator, test_eq_bf16, test_eq_exact, test_eq_f16, test_eq_f32};
use half::{bf16, f16};
use opgraph::NumericTensor;

pub fn test_add_scalar_i64(evaluator: &Evaluator) {
    let result = evaluator
        .add(&NumericTensor::from(3i64), &NumericTensor::from(4i64))
        .unwrap();
    assert_eq!(result.rank(), 0);
    test_eq_exact(result, NumericTensor::from(7i64));
}

pub fn test_add_vector_i64(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![1i64, 2]);
    let tensor_b = NumericTensor::from_vec(vec![3i64, 4]);
    let result = evaluator.add(&tensor_a, &tensor_b).unwrap();
    test_eq_exact(result, NumericTensor::from_vec(vec![4i64, 6]));
}

pub fn test_add_bf16(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![
        bf16::from_f32(0.75390625),
        bf16::from_f32(0.93359375),
        bf16::from_f32(0.13671875),
    ]);
    let tensor_b = NumericTensor::from_vec(vec![
        bf16::from_f32(4.40625),
        bf16::from_f32(5.65625),
        bf16::from_f32(38.25),
    ]);
    let result = evaluator.add(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![
        bf16::from_f32(5.15625),
        bf16::from_f32(6.59375),
        bf16::from_f32(38.25),
    ]);
    test_eq_bf16(result, correct);
}

pub fn test_add_f16(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![
        f16::from_f32(0.75390625),
        f16::from_f32(0.93359375),
        f16::from_f32(0.13671875),
    ]);
    let tensor_b = NumericTensor::from_vec(vec![
        f16::from_f32(4.40625),
        f16::from_f32(5.65625),
        f16::from_f32(38.25),
    ]);
    let result = evaluator.add(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![
        f16::from_f32(5.15625),
        f16::from_f32(6.59375),
        f16::from_f32(38.375),
    ]);
    test_eq_f16(result, correct);
}

pub fn test_add_fp32(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![0.15163845f32, 0.31361532, 5.393808]);
    let tensor_b = NumericTensor::from_vec(vec![1.3424649f32, 0.004955234, 6.920299]);
    let result = evaluator.add(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![1.4941034f32, 0.31857055, 12.314107]);
    test_eq_f32(result, correct);
}

pub fn test_add_broadcast_fp32(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_rows(vec![vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
    let tensor_b = NumericTensor::from_vec(vec![10.0f32, 20.0, 30.0]);
    let result = evaluator.add(&tensor_a, &tensor_b).unwrap();
    let correct =
        NumericTensor::from_rows(vec![vec![11.0f32, 22.0, 33.0], vec![14.0, 25.0, 36.0]]).unwrap();
    test_eq_f32(result, correct);
}

pub fn test_add_shape_mismatch(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![1.0f64, 2.0, 3.0]);
    let tensor_b = NumericTensor::from_vec(vec![1.0f64, 2.0]);
    let err = evaluator.add(&tensor_a, &tensor_b).unwrap_err();
    assert!(err.is_shape_mismatch(), "{err}");
}

pub fn test_add_dtype_mismatch(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from(1.0f32);
    let tensor_b = NumericTensor::from(1.0f64);
    assert!(evaluator.add(&tensor_a, &tensor_b).is_err());
}

pub fn test_mul_scalar_i64(evaluator: &Evaluator) {
    let result = evaluator
        .mul(&NumericTensor::from(3i64), &NumericTensor::from(4i64))
        .unwrap();
    test_eq_exact(result, NumericTensor::from(12i64));
}

pub fn test_mul_bf16(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![
        bf16::from_f32(0.75390625),
        bf16::from_f32(-2.5),
        bf16::from_f32(12.0),
    ]);
    let tensor_b = NumericTensor::from_vec(vec![
        bf16::from_f32(4.0),
        bf16::from_f32(0.5),
        bf16::from_f32(3.25),
    ]);
    let result = evaluator.mul(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![
        bf16::from_f32(3.015625),
        bf16::from_f32(-1.25),
        bf16::from_f32(39.0),
    ]);
    test_eq_bf16(result, correct);
}

pub fn test_mul_f16(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![
        f16::from_f32(0.75390625),
        f16::from_f32(-2.5),
        f16::from_f32(12.0),
    ]);
    let tensor_b = NumericTensor::from_vec(vec![
        f16::from_f32(4.0),
        f16::from_f32(0.5),
        f16::from_f32(3.25),
    ]);
    let result = evaluator.mul(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![
        f16::from_f32(3.015625),
        f16::from_f32(-1.25),
        f16::from_f32(39.0),
    ]);
    test_eq_f16(result, correct);
}

pub fn test_mul_fp32(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![0.5f32, -1.5, 2.25]);
    let tensor_b = NumericTensor::from_vec(vec![8.0f32, 2.0, -4.0]);
    let result = evaluator.mul(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_vec(vec![4.0f32, -3.0, -9.0]);
    test_eq_f32(result, correct);
}

pub fn test_mul_scalar_broadcast_fp32(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_rows(vec![vec![1.0f32, -2.0], vec![3.0, 0.5]]).unwrap();
    let tensor_b = NumericTensor::from(2.0f32);
    let result = evaluator.mul(&tensor_a, &tensor_b).unwrap();
    let correct = NumericTensor::from_rows(vec![vec![2.0f32, -4.0], vec![6.0, 1.0]]).unwrap();
    test_eq_f32(result, correct);
}

pub fn test_add_overflow_wraps_i64(evaluator: &Evaluator) {
    let result = evaluator
        .add(&NumericTensor::from(i64::MAX), &NumericTensor::from(1i64))
        .unwrap();
    test_eq_exact(result, NumericTensor::from(i64::MIN));
}

pub fn test_mul_overflow_wraps_i32(evaluator: &Evaluator) {
    let tensor_a = NumericTensor::from_vec(vec![i32::MAX, i32::MIN, 7]);
    let result = evaluator.mul(&tensor_a, &NumericTensor::from(2i32)).unwrap();
    test_eq_exact(result, NumericTensor::from_vec(vec![-2i32, 0, 14]));
}
