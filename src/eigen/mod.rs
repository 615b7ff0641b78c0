//! Eigen-Analysis
//!
//! Eigenvalues, eigenvectors and the continuous-time stability test derived
//! from them.

use std::fmt;

use nalgebra::linalg::Schur;
use nalgebra::SVD;
use ndarray::{Array1, Array2};
use num_complex::Complex64;
use tracing::debug;

use crate::error::{ControlError, ControlResult};
use crate::linalg::{ensure_finite, ensure_square, to_dmatrix, MAX_ITERATIONS};

/// Eigenvalues and eigenvectors of a square matrix.
#[derive(Clone, Debug)]
pub struct EigenDecomposition {
    /// Eigenvalues in the natural order of the Schur decomposition (unsorted).
    pub eigenvalues: Array1<Complex64>,
    /// Column `k` is a unit-norm eigenvector for `eigenvalues[k]`.
    pub eigenvectors: Array2<Complex64>,
}

/// Eigenvalues of a square matrix, in the order produced by the real Schur
/// form. Complex eigenvalues appear as conjugate pairs.
///
/// # Errors
///
/// * `InvalidShape` for non-square input
/// * `NonFinite` when `a` contains NaN or infinities
/// * `NoConvergence` when the QR iteration exceeds its budget
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::eigen::eigenvalues;
///
/// let eigs = eigenvalues(&array![[0.0, 1.0], [-1.0, 0.0]]).unwrap();
/// assert!(eigs.iter().all(|l| l.re.abs() < 1e-12 && (l.im.abs() - 1.0).abs() < 1e-12));
/// ```
pub fn eigenvalues(a: &Array2<f64>) -> ControlResult<Array1<Complex64>> {
    let n = ensure_square("eigen_decompose", a)?;
    if n == 0 {
        return Ok(Array1::zeros(0));
    }
    ensure_finite("eigen_decompose", a)?;

    let schur = Schur::try_new(to_dmatrix(a), f64::EPSILON, MAX_ITERATIONS).ok_or(
        ControlError::NoConvergence {
            op: "eigen_decompose",
            iterations: MAX_ITERATIONS,
        },
    )?;
    Ok(schur.complex_eigenvalues().iter().copied().collect())
}

/// Eigenvalues closer than this, relative to `max(1, ‖A‖_F)`, are treated
/// as one repeated eigenvalue when computing eigenvectors.
const CLUSTER_TOLERANCE: f64 = 1e-7;

/// Full eigen-decomposition of a square matrix.
///
/// Eigenvalues that coincide (within a tolerance relative to `‖A‖_F`) are
/// grouped. For a group of size `r` the null space of `A − λI` is taken from
/// the right singular vectors of its `r` smallest singular values, so a
/// repeated eigenvalue with `r` independent eigenvectors gets `r`
/// independent columns. Only a defective eigenvalue, whose null space is
/// smaller than its multiplicity, repeats a column.
///
/// Each column has unit norm with its largest component real and positive.
///
/// # Errors
///
/// Same as [`eigenvalues`].
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::eigen::eigen_decompose;
///
/// let a = array![[2.0, 0.0], [0.0, 3.0]];
/// let eig = eigen_decompose(&a).unwrap();
/// assert_eq!(eig.eigenvalues.len(), 2);
/// assert_eq!(eig.eigenvectors.shape(), &[2, 2]);
/// ```
pub fn eigen_decompose(a: &Array2<f64>) -> ControlResult<EigenDecomposition> {
    let values = eigenvalues(a)?;
    let n = values.len();
    let tol = CLUSTER_TOLERANCE * a.iter().map(|x| x * x).sum::<f64>().sqrt().max(1.0);

    let mut vectors = Array2::<Complex64>::zeros((n, n));
    let mut assigned = vec![false; n];
    for k in 0..n {
        if assigned[k] {
            continue;
        }
        let cluster: Vec<usize> = (k..n)
            .filter(|&j| !assigned[j] && (values[j] - values[k]).norm() <= tol)
            .collect();
        let center = cluster.iter().map(|&j| values[j]).sum::<Complex64>() / cluster.len() as f64;

        let basis = null_space(a, center, cluster.len(), tol)?;
        debug!(?center, multiplicity = cluster.len(), nullity = basis.len(), "eigen_decompose");
        for (slot, &j) in cluster.iter().enumerate() {
            // defective: fewer eigenvectors than positions
            let v = &basis[slot.min(basis.len() - 1)];
            vectors.column_mut(j).assign(v);
            assigned[j] = true;
        }
    }

    Ok(EigenDecomposition {
        eigenvalues: values,
        eigenvectors: vectors,
    })
}

/// Up to `max_vectors` orthonormal vectors spanning the numerical null space
/// of `A − λI`. The vector of the smallest singular value is always
/// returned; further ones only while their singular value is at most `tol`.
fn null_space(
    a: &Array2<f64>,
    lambda: Complex64,
    max_vectors: usize,
    tol: f64,
) -> ControlResult<Vec<Array1<Complex64>>> {
    let n = a.nrows();
    let shifted = a.mapv(|x| Complex64::new(x, 0.0)) - Array2::<Complex64>::eye(n) * lambda;

    let svd = SVD::try_new(to_dmatrix(&shifted), false, true, f64::EPSILON, MAX_ITERATIONS)
        .ok_or(ControlError::NoConvergence {
            op: "eigen_decompose",
            iterations: MAX_ITERATIONS,
        })?;
    let v_t = svd.v_t.ok_or(ControlError::NoConvergence {
        op: "eigen_decompose",
        iterations: MAX_ITERATIONS,
    })?;

    let mut order: Vec<usize> = (0..svd.singular_values.len()).collect();
    order.sort_by(|&x, &y| {
        svd.singular_values[x]
            .partial_cmp(&svd.singular_values[y])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let basis = order
        .iter()
        .take(max_vectors.max(1))
        .enumerate()
        .take_while(|&(rank, &i)| rank == 0 || svd.singular_values[i] <= tol)
        // v_t holds V^H, so the singular vector is the conjugated row
        .map(|(_, &i)| normalise(v_t.row(i).iter().map(|z| z.conj()).collect()))
        .collect();
    Ok(basis)
}

/// Scale to unit norm with the largest component real and positive.
fn normalise(mut v: Array1<Complex64>) -> Array1<Complex64> {
    let pivot = v
        .iter()
        .copied()
        .max_by(|x, y| x.norm().partial_cmp(&y.norm()).unwrap_or(std::cmp::Ordering::Equal))
        .unwrap_or(Complex64::new(1.0, 0.0));
    if pivot.norm() > 0.0 {
        let phase = pivot.conj() / pivot.norm();
        v.mapv_inplace(|z| z * phase);
    }
    let norm = v.iter().map(|z| z.norm_sqr()).sum::<f64>().sqrt();
    if norm > 0.0 {
        v.mapv_inplace(|z| z / norm);
    }
    v
}

/// Continuous-time stability: every eigenvalue has a strictly negative real
/// part. Eigenvalues on the imaginary axis make the matrix not stable.
pub fn classify_stability(a: &Array2<f64>) -> ControlResult<bool> {
    Ok(eigenvalues(a)?.iter().all(|l| l.re < 0.0))
}

/// Result of a stability check.
#[derive(Clone, Debug)]
pub struct StabilityCheck {
    /// Eigenvalues of the system matrix
    pub eigenvalues: Array1<Complex64>,
    /// Real parts of `eigenvalues`, position by position
    pub real_parts: Array1<f64>,
    /// True iff all real parts are strictly negative
    pub is_stable: bool,
}

/// Compute eigenvalues of `a` and classify continuous-time stability.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::eigen::check_stability;
///
/// assert!(check_stability(&array![[-1.0, 0.0], [0.0, -2.0]]).unwrap().is_stable);
/// assert!(!check_stability(&array![[1.0, 0.0], [0.0, -1.0]]).unwrap().is_stable);
/// ```
pub fn check_stability(a: &Array2<f64>) -> ControlResult<StabilityCheck> {
    let eigenvalues = eigenvalues(a)?;
    let real_parts = eigenvalues.mapv(|l| l.re);
    let is_stable = real_parts.iter().all(|&re| re < 0.0);
    debug!(?real_parts, is_stable, "check_stability");

    Ok(StabilityCheck {
        eigenvalues,
        real_parts,
        is_stable,
    })
}

impl fmt::Display for StabilityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "eigenvalues: {:.4}", self.eigenvalues)?;
        writeln!(f, "real parts:  {:.4}", self.real_parts)?;
        write!(f, "stable:      {}", if self.is_stable { "yes" } else { "no" })
    }
}
