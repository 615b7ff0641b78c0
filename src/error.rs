//! Error taxonomy shared by every routine in the crate.

use thiserror::Error;

/// Root error type for matrix and control-analysis failures.
#[derive(Error, Debug)]
pub enum ControlError {
    /// Operand shapes are incompatible for the requested operation.
    #[error("{op}: dimension mismatch between {left:?} and {right:?}")]
    DimensionMismatch {
        op: &'static str,
        left: (usize, usize),
        right: (usize, usize),
    },

    /// A square matrix was required.
    #[error("{op}: expected a square matrix, got {shape:?}")]
    InvalidShape {
        op: &'static str,
        shape: (usize, usize),
    },

    /// The matrix is (numerically) singular.
    #[error("{op}: matrix is singular")]
    Singular { op: &'static str },

    /// NaN or infinity reached a decomposition.
    #[error("{op}: matrix contains non-finite entries")]
    NonFinite { op: &'static str },

    /// An iterative decomposition ran out of its iteration budget.
    #[error("{op}: no convergence after {iterations} iterations")]
    NoConvergence { op: &'static str, iterations: usize },

    /// Pole placement was asked for an uncontrollable pair.
    #[error("pair (A, B) is not controllable: rank {rank} < {state_dim}")]
    Uncontrollable { rank: usize, state_dim: usize },

    /// The requested pole set cannot be realised by a real gain.
    #[error("infeasible pole set: {0}")]
    Infeasible(String),

    /// The closed loop missed the requested poles.
    #[error("placed poles deviate by {error:e}, tolerance {tolerance:e}")]
    PlacementInaccurate { error: f64, tolerance: f64 },

    /// Optional pole-placement collaborator missing or failed.
    #[error("pole placement unavailable: {0}")]
    Unavailable(String),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Reading a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ControlResult<T> = Result<T, ControlError>;

/// Shape of a 2-D array as a `(rows, cols)` tuple.
pub(crate) fn shape_of<T>(a: &ndarray::Array2<T>) -> (usize, usize) {
    (a.nrows(), a.ncols())
}
