//! Weighted sums over scalars, vectors and matrices.
//!
//! Weights are applied as given; callers that want a convex combination pass
//! weights summing to 1.

use crate::error::AcModelError;

/// `Σ values[i] * weights[i]`.
pub fn interpolate_values(values: &[f64], weights: &[f64]) -> Result<f64, AcModelError> {
    if values.len() != weights.len() {
        return Err(AcModelError::dimension(
            "interpolated values",
            weights.len(),
            values.len(),
        ));
    }
    Ok(values.iter().zip(weights).map(|(v, w)| v * w).sum())
}

/// Element-wise weighted sum of equal-length vectors.
pub fn interpolate_vectors(vectors: &[&[f64]], weights: &[f64]) -> Result<Vec<f64>, AcModelError> {
    let first = vectors
        .first()
        .ok_or_else(|| AcModelError::invalid_argument("no vectors to interpolate"))?;
    if vectors.len() != weights.len() {
        return Err(AcModelError::dimension(
            "interpolated vectors",
            weights.len(),
            vectors.len(),
        ));
    }
    let dim = first.len();
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(AcModelError::dimension("vector length", dim, bad.len()));
    }

    let mut column = Vec::with_capacity(vectors.len());
    (0..dim)
        .map(|i| {
            column.clear();
            column.extend(vectors.iter().map(|v| v[i]));
            interpolate_values(&column, weights)
        })
        .collect()
}

/// Row-wise weighted sum of equal-shape matrices.
pub fn interpolate_matrix(
    matrices: &[&[Vec<f64>]],
    weights: &[f64],
) -> Result<Vec<Vec<f64>>, AcModelError> {
    let first = matrices
        .first()
        .ok_or_else(|| AcModelError::invalid_argument("no matrices to interpolate"))?;
    let rows = first.len();
    if let Some(bad) = matrices.iter().find(|m| m.len() != rows) {
        return Err(AcModelError::dimension("matrix rows", rows, bad.len()));
    }

    (0..rows)
        .map(|r| {
            let row: Vec<&[f64]> = matrices.iter().map(|m| m[r].as_slice()).collect();
            interpolate_vectors(&row, weights)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn values_weighted_sum() {
        let got = interpolate_values(&[2.0, 4.0], &[0.25, 0.75]).unwrap();
        assert!(close(got, 3.5));
    }

    #[test]
    fn values_length_mismatch_is_rejected() {
        let err = interpolate_values(&[1.0, 2.0, 3.0], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(
            err,
            AcModelError::DimensionMismatch {
                expected: 2,
                found: 3,
                ..
            }
        ));
    }

    #[test]
    fn vectors_combine_element_wise() {
        let a = [1.0, 0.0, -2.0];
        let b = [3.0, 2.0, 2.0];
        let got = interpolate_vectors(&[&a, &b], &[0.5, 0.5]).unwrap();
        assert_eq!(got.len(), 3);
        assert!(close(got[0], 2.0));
        assert!(close(got[1], 1.0));
        assert!(close(got[2], 0.0));
    }

    #[test]
    fn vectors_of_unequal_length_fail() {
        let a = [1.0, 2.0];
        let b = [1.0, 2.0, 3.0];
        let err = interpolate_vectors(&[&a, &b], &[0.5, 0.5]).unwrap_err();
        assert!(matches!(err, AcModelError::DimensionMismatch { .. }));
    }

    #[test]
    fn no_vectors_is_an_invalid_argument() {
        let err = interpolate_vectors(&[], &[]).unwrap_err();
        assert!(matches!(err, AcModelError::InvalidArgument { .. }));
    }

    #[test]
    fn matrix_rows_combine() {
        let a = vec![vec![0.0, 1.0], vec![0.0, 0.0]];
        let b = vec![vec![0.5, 0.5], vec![0.0, 0.0]];
        let got = interpolate_matrix(&[&a, &b], &[0.8, 0.2]).unwrap();
        assert!(close(got[0][0], 0.1));
        assert!(close(got[0][1], 0.9));
        assert_eq!(got[1], vec![0.0, 0.0]);
    }

    #[test]
    fn matrix_shape_mismatch_fails() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 0.0]];
        let b = vec![vec![1.0, 0.0, 0.0]];
        assert!(interpolate_matrix(&[&a, &b], &[0.5, 0.5]).is_err());
    }
}
