//! Dense Matrix Algebra
//!
//! Elementary operations on small dense matrices: sums, products, transposes,
//! inverses, determinants, integer powers, singular values and numerical rank.
//! All routines take `ndarray` arrays by reference and return new arrays; the
//! inputs are never modified.
//!
//! Factorisations (LU, SVD) are delegated to `nalgebra`. The conversion between
//! the two array types happens at the boundary of each routine so callers only
//! ever see `ndarray`.

use std::fmt;

use nalgebra::{DMatrix, SVD};
use ndarray::{Array1, Array2};
use tracing::{debug, warn};

use crate::config::{AnalysisConfig, RankTolerance};
use crate::error::{shape_of, ControlError, ControlResult};

/// Iteration budget handed to nalgebra's iterative decompositions.
pub const MAX_ITERATIONS: usize = 10_000;

/// Default relative-determinant threshold used by [`invert`].
pub const DEFAULT_SINGULARITY_TOLERANCE: f64 = 1e-12;

pub(crate) fn to_dmatrix<T: nalgebra::Scalar + Copy>(a: &Array2<T>) -> DMatrix<T> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[(i, j)])
}

pub(crate) fn from_dmatrix<T: nalgebra::Scalar + Copy>(m: &DMatrix<T>) -> Array2<T> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

pub(crate) fn ensure_square(op: &'static str, a: &Array2<f64>) -> ControlResult<usize> {
    if a.nrows() != a.ncols() {
        return Err(ControlError::InvalidShape {
            op,
            shape: shape_of(a),
        });
    }
    Ok(a.nrows())
}

pub(crate) fn ensure_finite(op: &'static str, a: &Array2<f64>) -> ControlResult<()> {
    if a.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(ControlError::NonFinite { op })
    }
}

/// Identity matrix of order `n`.
pub fn identity(n: usize) -> Array2<f64> {
    Array2::eye(n)
}

/// Element-wise sum `A + B`.
///
/// # Errors
///
/// `DimensionMismatch` unless both operands have the same shape.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::linalg::add;
///
/// let s = add(&array![[1.0, 2.0], [3.0, 4.0]], &array![[5.0, 6.0], [7.0, 8.0]]).unwrap();
/// assert_eq!(s, array![[6.0, 8.0], [10.0, 12.0]]);
/// ```
pub fn add(a: &Array2<f64>, b: &Array2<f64>) -> ControlResult<Array2<f64>> {
    if a.shape() != b.shape() {
        return Err(ControlError::DimensionMismatch {
            op: "add",
            left: shape_of(a),
            right: shape_of(b),
        });
    }
    Ok(a + b)
}

/// Matrix product `A · B`.
///
/// # Errors
///
/// `DimensionMismatch` when `a.ncols() != b.nrows()`.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::linalg::multiply;
///
/// let p = multiply(&array![[1.0, 2.0], [3.0, 4.0]], &array![[5.0, 6.0], [7.0, 8.0]]).unwrap();
/// assert_eq!(p, array![[19.0, 22.0], [43.0, 50.0]]);
/// ```
pub fn multiply(a: &Array2<f64>, b: &Array2<f64>) -> ControlResult<Array2<f64>> {
    if a.ncols() != b.nrows() {
        return Err(ControlError::DimensionMismatch {
            op: "multiply",
            left: shape_of(a),
            right: shape_of(b),
        });
    }
    Ok(a.dot(b))
}

/// Transpose `Aᵀ` as a new, standard-layout array.
pub fn transpose(a: &Array2<f64>) -> Array2<f64> {
    a.t().as_standard_layout().into_owned()
}

/// Determinant of a square matrix.
///
/// Uses nalgebra's closed forms up to 3×3 and an LU factorisation beyond
/// that. The 0×0 matrix has determinant 1.
///
/// # Errors
///
/// `InvalidShape` for non-square input.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::linalg::determinant;
///
/// let d = determinant(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
/// assert!((d + 2.0).abs() < 1e-12);
/// ```
pub fn determinant(a: &Array2<f64>) -> ControlResult<f64> {
    let n = ensure_square("determinant", a)?;
    if n == 0 {
        return Ok(1.0);
    }
    Ok(to_dmatrix(a).determinant())
}

/// Inverse of a square matrix using the default singularity tolerance.
///
/// See [`invert_with_tolerance`].
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::linalg::invert;
///
/// let inv = invert(&array![[4.0, 7.0], [2.0, 6.0]]).unwrap();
/// assert!((inv[(0, 0)] - 0.6).abs() < 1e-12);
/// assert!(invert(&array![[1.0, 2.0], [2.0, 4.0]]).is_err());
/// ```
pub fn invert(a: &Array2<f64>) -> ControlResult<Array2<f64>> {
    invert_with_tolerance(a, DEFAULT_SINGULARITY_TOLERANCE)
}

/// Inverse of a square matrix.
///
/// The matrix is declared singular when
///
/// ```text
/// |det(A)| / Π ‖row_i(A)‖₂  <=  tol
/// ```
///
/// (the ratio lies in `[0, 1]` by Hadamard's inequality, so `tol` does not
/// depend on the scale of `A`), when the LU factorisation hits a zero pivot,
/// or when the computed inverse is not finite. Both sides are evaluated as
/// logarithms, so entries like `1e±20` in a 20×20 matrix are handled.
///
/// # Errors
///
/// * `InvalidShape` for non-square input
/// * `Singular` as described above
pub fn invert_with_tolerance(a: &Array2<f64>, tol: f64) -> ControlResult<Array2<f64>> {
    let n = ensure_square("invert", a)?;
    if n == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let lu = to_dmatrix(a).lu();

    // compared in the log domain: det and the row-norm product over- or
    // underflow long before the ratio does
    let mut log_det = 0.0;
    for pivot in lu.u().diagonal().iter() {
        if *pivot == 0.0 {
            debug!("invert: zero pivot");
            return Err(ControlError::Singular { op: "invert" });
        }
        log_det += pivot.abs().ln();
    }
    let mut log_row_scale = 0.0;
    for row in a.rows() {
        let peak = row.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        if peak == 0.0 {
            return Err(ControlError::Singular { op: "invert" });
        }
        log_row_scale += peak.ln() + 0.5 * row.iter().map(|x| (x / peak).powi(2)).sum::<f64>().ln();
    }

    let log_ratio = log_det - log_row_scale;
    if log_ratio.is_nan() || (tol > 0.0 && log_ratio <= tol.ln()) {
        debug!(log_det, log_row_scale, tol, "invert: relative determinant below tolerance");
        return Err(ControlError::Singular { op: "invert" });
    }

    let inv = lu
        .try_inverse()
        .ok_or(ControlError::Singular { op: "invert" })?;
    if inv.iter().any(|x| !x.is_finite()) {
        return Err(ControlError::Singular { op: "invert" });
    }
    Ok(from_dmatrix(&inv))
}

/// Integer power `A^k` by repeated multiplication; `A^0 = I`.
///
/// # Errors
///
/// `InvalidShape` for non-square input.
pub fn matrix_power(a: &Array2<f64>, k: u32) -> ControlResult<Array2<f64>> {
    let n = ensure_square("matrix_power", a)?;
    let mut result = identity(n);
    for _ in 0..k {
        result = a.dot(&result);
    }
    Ok(result)
}

/// Singular values in descending order.
///
/// # Errors
///
/// * `NonFinite` if `a` contains NaN or infinities
/// * `NoConvergence` if the SVD exceeds [`MAX_ITERATIONS`]
pub fn singular_values(a: &Array2<f64>) -> ControlResult<Array1<f64>> {
    if a.is_empty() {
        return Ok(Array1::zeros(0));
    }
    ensure_finite("singular_values", a)?;

    let svd = SVD::try_new(to_dmatrix(a), false, false, f64::EPSILON, MAX_ITERATIONS).ok_or(
        ControlError::NoConvergence {
            op: "singular_values",
            iterations: MAX_ITERATIONS,
        },
    )?;
    Ok(svd.singular_values.iter().copied().collect())
}

/// Numerical rank: the number of singular values strictly greater than the
/// threshold resolved from `tol`.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::config::RankTolerance;
/// use statespace_rs::linalg::numerical_rank;
///
/// let rank = numerical_rank(&array![[1.0, 2.0], [2.0, 4.0]], RankTolerance::Relative).unwrap();
/// assert_eq!(rank, 1);
/// ```
pub fn numerical_rank(a: &Array2<f64>, tol: RankTolerance) -> ControlResult<usize> {
    let sv = singular_values(a)?;
    let sigma_max = sv.first().copied().unwrap_or(0.0);
    let threshold = tol.threshold(shape_of(a), sigma_max);
    let rank = sv.iter().filter(|&&s| s > threshold).count();
    debug!(?sv, threshold, rank, "numerical_rank");
    Ok(rank)
}

/// Results of the elementary operations on a pair of matrices.
///
/// Optional fields are present only when the corresponding computation
/// succeeded.
#[derive(Clone, Debug)]
pub struct MatrixOperations {
    /// `A + B`
    pub sum: Option<Array2<f64>>,
    /// `A · B`
    pub product: Option<Array2<f64>>,
    /// `Aᵀ`
    pub transpose: Array2<f64>,
    /// `A⁻¹`
    pub inverse: Option<Array2<f64>>,
    /// `det(A)`
    pub determinant: Option<f64>,
}

/// Run sum, product, transpose, inverse and determinant on `a` (and `b`).
///
/// Failures are logged and leave the field empty; the remaining results are
/// still returned.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::config::AnalysisConfig;
/// use statespace_rs::linalg::matrix_operations;
///
/// let a = array![[1.0, 2.0], [2.0, 4.0]];
/// let b = array![[5.0, 6.0], [7.0, 8.0]];
/// let ops = matrix_operations(&a, &b, &AnalysisConfig::default());
/// assert!(ops.sum.is_some());
/// assert!(ops.inverse.is_none());
/// ```
pub fn matrix_operations(
    a: &Array2<f64>,
    b: &Array2<f64>,
    config: &AnalysisConfig,
) -> MatrixOperations {
    fn keep<T>(what: &str, result: ControlResult<T>) -> Option<T> {
        result
            .map_err(|e| warn!(error = %e, "matrix_operations: {what} not computed"))
            .ok()
    }

    MatrixOperations {
        sum: keep("sum", add(a, b)),
        product: keep("product", multiply(a, b)),
        transpose: transpose(a),
        inverse: keep(
            "inverse",
            invert_with_tolerance(a, config.singularity_tolerance),
        ),
        determinant: keep("determinant", determinant(a)),
    }
}

impl fmt::Display for MatrixOperations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(f: &mut fmt::Formatter<'_>, label: &str, v: &Option<T>) -> fmt::Result {
            match v {
                Some(v) => writeln!(f, "{label}:\n{v:.4}"),
                None => writeln!(f, "{label}: not available"),
            }
        }
        opt(f, "A + B", &self.sum)?;
        opt(f, "A * B", &self.product)?;
        writeln!(f, "A^T:\n{:.4}", self.transpose)?;
        opt(f, "A^-1", &self.inverse)?;
        opt(f, "det(A)", &self.determinant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_add_shape_mismatch() {
        let a = array![[1.0, 2.0]];
        let b = array![[1.0], [2.0]];
        let err = add(&a, &b).unwrap_err();
        assert!(matches!(
            err,
            ControlError::DimensionMismatch {
                op: "add",
                left: (1, 2),
                right: (2, 1)
            }
        ));
    }

    #[test]
    fn test_multiply_rectangular() {
        let a = array![[1.0, 0.0, 2.0]];
        let b = array![[1.0], [3.0], [4.0]];
        assert_eq!(multiply(&a, &b).unwrap(), array![[9.0]]);
        assert!(multiply(&a, &a).is_err());
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let a = array![[1.5, -2.0, 3.25], [0.0, 4.0, -1e-9]];
        let t = transpose(&a);
        assert_eq!(t.shape(), &[3, 2]);
        assert_eq!(transpose(&t), a);
    }

    #[test]
    fn test_determinant_values() {
        assert_abs_diff_eq!(determinant(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap(), -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(
            determinant(&array![[2.0, 0.0, 0.0, 0.0], [0.0, 3.0, 0.0, 0.0], [0.0, 0.0, 4.0, 0.0], [1.0, 0.0, 0.0, 5.0]])
                .unwrap(),
            120.0,
            epsilon = 1e-10
        );
        assert_eq!(determinant(&Array2::zeros((0, 0))).unwrap(), 1.0);
    }

    #[test]
    fn test_determinant_non_square() {
        let err = determinant(&Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, ControlError::InvalidShape { shape: (2, 3), .. }));
    }

    #[test]
    fn test_invert_round_trip() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let inv = invert(&a).unwrap();
        assert_abs_diff_eq!(a.dot(&inv), identity(2), epsilon = 1e-12);
        assert_abs_diff_eq!(inv, array![[-2.0, 1.0], [1.5, -0.5]], epsilon = 1e-12);
    }

    #[test]
    fn test_invert_singular() {
        let err = invert(&array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap_err();
        assert!(matches!(err, ControlError::Singular { .. }));

        let err = invert(&array![[0.0, 0.0], [1.0, 1.0]]).unwrap_err();
        assert!(matches!(err, ControlError::Singular { .. }));
    }

    #[test]
    fn test_invert_is_scale_invariant() {
        let a = array![[1e-8, 2e-8], [3e-8, 4e-8]];
        assert!(invert(&a).is_ok());
        let b = array![[1e8, 2e8], [3e8, 4e8]];
        assert!(invert(&b).is_ok());
    }

    #[test]
    fn test_invert_extreme_scaled_identity() {
        // det is 1e±400 here, outside f64 range
        for scale in [1e20, 1e-20] {
            let a = identity(20) * scale;
            let inv = invert(&a).unwrap();
            assert_abs_diff_eq!(inv, identity(20) / scale, epsilon = 1e-12 / scale);
        }
    }

    #[test]
    fn test_invert_with_zero_tolerance_accepts_near_singular() {
        let a = array![[1.0, 1.0], [1.0, 1.0 + 1e-14]];
        assert!(invert(&a).is_err());
        assert!(invert_with_tolerance(&a, 0.0).is_ok());
    }

    #[test]
    fn test_matrix_power() {
        let a = array![[1.0, 1.0], [0.0, 1.0]];
        assert_eq!(matrix_power(&a, 0).unwrap(), identity(2));
        assert_eq!(matrix_power(&a, 1).unwrap(), a);
        assert_eq!(matrix_power(&a, 5).unwrap(), array![[1.0, 5.0], [0.0, 1.0]]);
        assert!(matrix_power(&Array2::zeros((2, 1)), 2).is_err());
    }

    #[test]
    fn test_singular_values_descending() {
        let sv = singular_values(&array![[3.0, 0.0], [0.0, -5.0], [0.0, 0.0]]).unwrap();
        assert_eq!(sv.len(), 2);
        assert_abs_diff_eq!(sv[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sv[1], 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_singular_values_non_finite() {
        let err = singular_values(&array![[f64::NAN, 1.0], [0.0, 1.0]]).unwrap_err();
        assert!(matches!(err, ControlError::NonFinite { .. }));
    }

    #[test]
    fn test_numerical_rank() {
        let tol = RankTolerance::Relative;
        assert_eq!(numerical_rank(&identity(3), tol).unwrap(), 3);
        assert_eq!(numerical_rank(&Array2::zeros((2, 2)), tol).unwrap(), 0);
        assert_eq!(numerical_rank(&Array2::zeros((0, 3)), tol).unwrap(), 0);
        assert_eq!(
            numerical_rank(&array![[1.0, 0.0], [0.0, 1e-6]], RankTolerance::Absolute { value: 1e-3 }).unwrap(),
            1
        );
    }

    #[test]
    fn test_matrix_operations_reference_pair() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let b = array![[5.0, 6.0], [7.0, 8.0]];
        let ops = matrix_operations(&a, &b, &AnalysisConfig::default());

        assert_eq!(ops.sum.unwrap(), array![[6.0, 8.0], [10.0, 12.0]]);
        assert_eq!(ops.product.unwrap(), array![[19.0, 22.0], [43.0, 50.0]]);
        assert_eq!(ops.transpose, array![[1.0, 3.0], [2.0, 4.0]]);
        assert_abs_diff_eq!(ops.determinant.unwrap(), -2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(a.dot(&ops.inverse.unwrap()), identity(2), epsilon = 1e-12);
    }

    #[test]
    fn test_matrix_operations_partial_results() {
        let a = array![[1.0, 2.0, 3.0]];
        let b = array![[1.0, 2.0, 3.0]];
        let ops = matrix_operations(&a, &b, &AnalysisConfig::default());

        assert!(ops.sum.is_some());
        assert!(ops.product.is_none());
        assert!(ops.inverse.is_none());
        assert!(ops.determinant.is_none());
        assert_eq!(ops.transpose.shape(), &[3, 1]);
    }
}
