//! Structural Analysis
//!
//! Controllability and observability of a state-space pair, decided by the
//! numerical rank of the Kalman matrices
//!
//! ```text
//! 𝒞 = [ B  AB  A²B  ...  A^(n-1)B ]          (n × n·m)
//!
//! 𝒪 = [ C ; CA ; CA² ; ... ; CA^(n-1) ]      (n·p × n)
//! ```
//!
//! A pair is controllable (observable) iff the corresponding matrix has rank
//! `n`. Rank is estimated from singular values with an explicit
//! [`RankTolerance`].

use std::fmt;

use ndarray::{s, Array2};
use tracing::debug;

use crate::config::RankTolerance;
use crate::error::{shape_of, ControlError, ControlResult};
use crate::linalg::{ensure_square, numerical_rank};

/// Build the controllability matrix `[B, AB, ..., A^(n-1)B]`.
///
/// Block `k` is computed as `A · block(k-1)`, reusing the running power.
///
/// # Arguments
///
/// * `a` - N×N state matrix
/// * `b` - N×M input matrix
///
/// # Returns
///
/// The N×(N·M) controllability matrix.
///
/// # Errors
///
/// * `InvalidShape` if `a` is not square
/// * `DimensionMismatch` if `b` does not have N rows
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::analysis::controllability_matrix;
///
/// let a = array![[-1.0, 1.0], [0.0, -1.0]];
/// let b = array![[0.0], [1.0]];
/// assert_eq!(controllability_matrix(&a, &b).unwrap(), array![[0.0, 1.0], [1.0, -1.0]]);
/// ```
pub fn controllability_matrix(a: &Array2<f64>, b: &Array2<f64>) -> ControlResult<Array2<f64>> {
    let n = ensure_square("controllability_matrix", a)?;
    if b.nrows() != n {
        return Err(ControlError::DimensionMismatch {
            op: "controllability_matrix",
            left: shape_of(a),
            right: shape_of(b),
        });
    }
    let m = b.ncols();

    let mut ctrb = Array2::zeros((n, n * m));
    let mut block = b.to_owned();
    for k in 0..n {
        if k > 0 {
            block = a.dot(&block);
        }
        ctrb.slice_mut(s![.., k * m..(k + 1) * m]).assign(&block);
    }
    Ok(ctrb)
}

/// Build the observability matrix `[C; CA; ...; CA^(n-1)]`.
///
/// Block `k` is computed as `block(k-1) · A`.
///
/// # Arguments
///
/// * `a` - N×N state matrix
/// * `c` - P×N output matrix
///
/// # Returns
///
/// The (N·P)×N observability matrix.
///
/// # Errors
///
/// * `InvalidShape` if `a` is not square
/// * `DimensionMismatch` if `c` does not have N columns
pub fn observability_matrix(a: &Array2<f64>, c: &Array2<f64>) -> ControlResult<Array2<f64>> {
    let n = ensure_square("observability_matrix", a)?;
    if c.ncols() != n {
        return Err(ControlError::DimensionMismatch {
            op: "observability_matrix",
            left: shape_of(a),
            right: shape_of(c),
        });
    }
    let p = c.nrows();

    let mut obsv = Array2::zeros((n * p, n));
    let mut block = c.to_owned();
    for k in 0..n {
        if k > 0 {
            block = block.dot(a);
        }
        obsv.slice_mut(s![k * p..(k + 1) * p, ..]).assign(&block);
    }
    Ok(obsv)
}

/// Outcome of a controllability test with its intermediate values.
#[derive(Clone, Debug)]
pub struct ControllabilityCheck {
    /// Controllability matrix `[B, AB, ..., A^(n-1)B]`
    pub matrix: Array2<f64>,
    /// Numerical rank of `matrix`
    pub rank: usize,
    /// State dimension N
    pub state_dim: usize,
    /// `rank == state_dim`
    pub is_controllable: bool,
}

/// Outcome of an observability test with its intermediate values.
#[derive(Clone, Debug)]
pub struct ObservabilityCheck {
    /// Observability matrix `[C; CA; ...; CA^(n-1)]`
    pub matrix: Array2<f64>,
    /// Numerical rank of `matrix`
    pub rank: usize,
    /// State dimension N
    pub state_dim: usize,
    /// `rank == state_dim`
    pub is_observable: bool,
}

/// Decide controllability of `(A, B)` from the rank of its controllability
/// matrix.
///
/// # Errors
///
/// Shape errors from [`controllability_matrix`]; `NonFinite` /
/// `NoConvergence` from the rank estimate.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::analysis::check_controllability;
/// use statespace_rs::config::RankTolerance;
///
/// let a = array![[-1.0, 1.0], [0.0, -1.0]];
/// let b = array![[0.0], [1.0]];
/// let check = check_controllability(&a, &b, RankTolerance::default()).unwrap();
/// assert_eq!(check.rank, 2);
/// assert!(check.is_controllable);
/// ```
pub fn check_controllability(
    a: &Array2<f64>,
    b: &Array2<f64>,
    tol: RankTolerance,
) -> ControlResult<ControllabilityCheck> {
    let matrix = controllability_matrix(a, b)?;
    let rank = numerical_rank(&matrix, tol)?;
    let state_dim = a.nrows();
    debug!(rank, state_dim, "check_controllability");

    Ok(ControllabilityCheck {
        matrix,
        rank,
        state_dim,
        is_controllable: rank == state_dim,
    })
}

/// Decide observability of `(A, C)` from the rank of its observability
/// matrix.
///
/// # Errors
///
/// Shape errors from [`observability_matrix`]; `NonFinite` /
/// `NoConvergence` from the rank estimate.
pub fn check_observability(
    a: &Array2<f64>,
    c: &Array2<f64>,
    tol: RankTolerance,
) -> ControlResult<ObservabilityCheck> {
    let matrix = observability_matrix(a, c)?;
    let rank = numerical_rank(&matrix, tol)?;
    let state_dim = a.nrows();
    debug!(rank, state_dim, "check_observability");

    Ok(ObservabilityCheck {
        matrix,
        rank,
        state_dim,
        is_observable: rank == state_dim,
    })
}

impl fmt::Display for ControllabilityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "controllability matrix:\n{:.4}", self.matrix)?;
        writeln!(f, "rank: {} (state dimension {})", self.rank, self.state_dim)?;
        write!(f, "controllable: {}", if self.is_controllable { "yes" } else { "no" })
    }
}

impl fmt::Display for ObservabilityCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "observability matrix:\n{:.4}", self.matrix)?;
        writeln!(f, "rank: {} (state dimension {})", self.rank, self.state_dim)?;
        write!(f, "observable: {}", if self.is_observable { "yes" } else { "no" })
    }
}
