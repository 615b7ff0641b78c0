//! statespace-rs: linear algebra for state-space control analysis
//!
//! Small dense-matrix routines applied to continuous-time LTI systems
//!
//! ```text
//! dx/dt = A x + B u,    y = C x + D u
//! ```
//!
//! # Organization
//!
//! - `linalg`: Dense matrix algebra (sum, product, inverse, determinant, rank)
//! - `eigen`: Eigen-decomposition and stability classification
//! - `analysis`: Controllability / observability matrices and rank checks
//! - `model`: `StateSpace` and the DC motor builder
//! - `synthesis`: State-feedback design by pole placement
//! - `config`: Numerical tolerances, loadable from TOML
//! - `error`: `ControlError` shared by all of the above
//!
//! # Example
//!
//! ```
//! use statespace_rs::analysis::check_controllability;
//! use statespace_rs::config::RankTolerance;
//! use statespace_rs::eigen::classify_stability;
//! use statespace_rs::model::dc_motor_state_space;
//!
//! let sys = dc_motor_state_space(0.01, 0.1, 0.1, 0.1, 1.0, 0.1);
//! assert!(classify_stability(&sys.a).unwrap());
//! assert!(check_controllability(&sys.a, &sys.b, RankTolerance::default())
//!     .unwrap()
//!     .is_controllable);
//! ```

pub mod analysis;
pub mod config;
pub mod eigen;
pub mod error;
pub mod linalg;
pub mod model;
pub mod synthesis;

pub use config::{AnalysisConfig, RankTolerance};
pub use error::{ControlError, ControlResult};
pub use model::{dc_motor_state_space, DcMotorParams, StateSpace};
