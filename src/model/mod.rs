//! State-Space Models
//!
//! The [`StateSpace`] value type for continuous-time LTI systems
//!
//! ```text
//! dx/dt = A x + B u
//!     y = C x + D u
//! ```
//!
//! and a builder for the two-state armature-controlled DC motor.

use std::fmt;

use ndarray::{array, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{shape_of, ControlError, ControlResult};

/// Linear time-invariant system in state-space form.
#[derive(Clone, Debug, PartialEq)]
pub struct StateSpace {
    /// N×N state matrix
    pub a: Array2<f64>,
    /// N×M input matrix
    pub b: Array2<f64>,
    /// P×N output matrix
    pub c: Array2<f64>,
    /// P×M feedthrough matrix
    pub d: Array2<f64>,
}

impl StateSpace {
    /// Assemble a system after checking that the four matrices agree on
    /// N, M and P.
    ///
    /// # Errors
    ///
    /// * `InvalidShape` if `a` is not square
    /// * `DimensionMismatch` if `b`, `c` or `d` disagree with `a` or each other
    pub fn new(
        a: Array2<f64>,
        b: Array2<f64>,
        c: Array2<f64>,
        d: Array2<f64>,
    ) -> ControlResult<Self> {
        let n = a.nrows();
        if a.ncols() != n {
            return Err(ControlError::InvalidShape {
                op: "state_space",
                shape: shape_of(&a),
            });
        }
        if b.nrows() != n {
            return Err(ControlError::DimensionMismatch {
                op: "state_space (B rows vs A)",
                left: shape_of(&a),
                right: shape_of(&b),
            });
        }
        if c.ncols() != n {
            return Err(ControlError::DimensionMismatch {
                op: "state_space (C columns vs A)",
                left: shape_of(&a),
                right: shape_of(&c),
            });
        }
        if d.nrows() != c.nrows() || d.ncols() != b.ncols() {
            return Err(ControlError::DimensionMismatch {
                op: "state_space (D vs C rows, B columns)",
                left: (c.nrows(), b.ncols()),
                right: shape_of(&d),
            });
        }
        Ok(Self { a, b, c, d })
    }

    /// Number of states N.
    pub fn state_dim(&self) -> usize {
        self.a.nrows()
    }

    /// Number of inputs M.
    pub fn input_dim(&self) -> usize {
        self.b.ncols()
    }

    /// Number of outputs P.
    pub fn output_dim(&self) -> usize {
        self.c.nrows()
    }
}

impl fmt::Display for StateSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "A =\n{:.4}", self.a)?;
        writeln!(f, "B =\n{:.4}", self.b)?;
        writeln!(f, "C =\n{:.4}", self.c)?;
        write!(f, "D =\n{:.4}", self.d)
    }
}

/// Physical parameters of an armature-controlled DC motor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DcMotorParams {
    /// Rotor inertia J (kg·m²)
    pub j: f64,
    /// Viscous friction b (N·m·s)
    pub b: f64,
    /// Torque constant Kt (N·m/A)
    pub kt: f64,
    /// Back-EMF constant Ke (V·s/rad)
    pub ke: f64,
    /// Armature resistance R (Ω)
    pub r: f64,
    /// Armature inductance L (H)
    pub l: f64,
}

impl DcMotorParams {
    /// State-space model for these parameters, see [`dc_motor_state_space`].
    pub fn state_space(&self) -> StateSpace {
        dc_motor_state_space(self.j, self.b, self.kt, self.ke, self.r, self.l)
    }
}

/// DC motor model with state `x = [ω, i]ᵀ`, input voltage `u = V` and output
/// speed `y = ω`:
///
/// ```text
/// A = [ -b/J   Kt/J ]    B = [  0  ]    C = [ 1  0 ]    D = [ 0 ]
///     [ -Ke/L  -R/L ]        [ 1/L ]
/// ```
///
/// No parameter is validated. Zero or negative values flow through IEEE
/// arithmetic, so `J = 0` or `L = 0` yields infinities or NaN in the matrices
/// rather than an error.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::model::dc_motor_state_space;
///
/// let sys = dc_motor_state_space(0.01, 0.1, 0.1, 0.1, 1.0, 0.1);
/// assert_eq!(sys.c, array![[1.0, 0.0]]);
/// assert_eq!(sys.state_dim(), 2);
/// ```
pub fn dc_motor_state_space(j: f64, b: f64, kt: f64, ke: f64, r: f64, l: f64) -> StateSpace {
    StateSpace {
        a: array![[-b / j, kt / j], [-ke / l, -r / l]],
        b: array![[0.0], [1.0 / l]],
        c: array![[1.0, 0.0]],
        d: array![[0.0]],
    }
}
