//! Synthesis Routines
//!
//! State-feedback design by pole placement. Given a pair `(A, B)` and a set of
//! desired closed-loop eigenvalues, find a gain `K` such that
//!
//! ```text
//! eig(A − B K) = desired poles
//! ```
//!
//! The gain itself comes from a [`PolePlacer`]. The crate ships
//! [`AckermannPlacer`] behind the `pole-placement` cargo feature; without it
//! (or with a `None` placer) the designer reports the placement as
//! unavailable instead of failing.

use std::fmt;

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::eigen::eigenvalues;
use crate::error::{shape_of, ControlError, ControlResult};
use crate::linalg::ensure_square;

/// Root-placement algorithm computing a state-feedback gain.
///
/// Implementations receive a square `a` and a `b` with matching row count,
/// and `poles` exactly as requested by the caller. They return the M×N gain
/// `K` for the convention `u = −K x`.
pub trait PolePlacer {
    /// Short identifier used in logs and reports.
    fn name(&self) -> &'static str;

    /// Compute `K` so that `A − B K` has the requested eigenvalues.
    fn place(
        &self,
        a: &Array2<f64>,
        b: &Array2<f64>,
        poles: &[Complex64],
    ) -> ControlResult<Array2<f64>>;
}

/// Why a pole placement produced no gain.
#[derive(Debug)]
pub enum UnavailableReason {
    /// No placement algorithm is available in this build.
    BackendMissing,
    /// The placer or the closed-loop verification failed.
    Failed(ControlError),
}

/// Sentinel returned instead of a gain.
#[derive(Debug)]
pub struct Unavailable {
    pub reason: UnavailableReason,
}

/// Successful pole placement.
#[derive(Clone, Debug)]
pub struct PoleAssignment {
    /// M×N state-feedback gain `K`
    pub gain: Array2<f64>,
    /// Closed-loop matrix `A − B K`
    pub closed_loop: Array2<f64>,
    /// Eigenvalues of `closed_loop`, recomputed independently of the placer
    pub closed_loop_eigenvalues: Array1<Complex64>,
    /// Poles as requested
    pub requested_poles: Array1<Complex64>,
    /// Largest distance between a requested pole and its matched
    /// closed-loop eigenvalue
    pub max_pole_error: f64,
    /// Name of the placer that produced `gain`
    pub placer: &'static str,
}

/// Outcome of [`pole_placement`]: either a gain or a reported sentinel.
#[derive(Debug)]
pub enum PolePlacement {
    Placed(PoleAssignment),
    Unavailable(Unavailable),
}

impl PolePlacement {
    pub fn is_placed(&self) -> bool {
        matches!(self, PolePlacement::Placed(_))
    }

    pub fn assignment(&self) -> Option<&PoleAssignment> {
        match self {
            PolePlacement::Placed(assignment) => Some(assignment),
            PolePlacement::Unavailable(_) => None,
        }
    }

    /// Convert into a `Result`, mapping the sentinel to
    /// [`ControlError::Unavailable`].
    pub fn into_result(self) -> ControlResult<PoleAssignment> {
        match self {
            PolePlacement::Placed(assignment) => Ok(assignment),
            PolePlacement::Unavailable(u) => Err(ControlError::Unavailable(u.to_string())),
        }
    }
}

/// Real poles as complex numbers with zero imaginary part.
pub fn real_poles(poles: &[f64]) -> Vec<Complex64> {
    poles.iter().map(|&p| Complex64::new(p, 0.0)).collect()
}

/// The placer compiled into this build, configured from `config`.
///
/// Returns `None` when the crate is built without the `pole-placement`
/// feature.
#[cfg(feature = "pole-placement")]
pub fn default_placer(config: &AnalysisConfig) -> Option<Box<dyn PolePlacer>> {
    Some(Box::new(AckermannPlacer {
        rank_tolerance: config.rank_tolerance,
    }))
}

/// The placer compiled into this build, configured from `config`.
///
/// Returns `None` when the crate is built without the `pole-placement`
/// feature.
#[cfg(not(feature = "pole-placement"))]
pub fn default_placer(_config: &AnalysisConfig) -> Option<Box<dyn PolePlacer>> {
    None
}

/// Pole placement with the default placer and default configuration.
///
/// See [`pole_placement_with`].
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use statespace_rs::synthesis::{pole_placement, real_poles};
///
/// let a = array![[0.0, 1.0], [0.0, 0.0]];
/// let b = array![[0.0], [1.0]];
/// let outcome = pole_placement(&a, &b, &real_poles(&[-1.0, -2.0]));
/// # #[cfg(feature = "pole-placement")]
/// # {
/// let k = &outcome.assignment().unwrap().gain;
/// assert!((k[(0, 0)] - 2.0).abs() < 1e-9 && (k[(0, 1)] - 3.0).abs() < 1e-9);
/// # }
/// ```
pub fn pole_placement(a: &Array2<f64>, b: &Array2<f64>, poles: &[Complex64]) -> PolePlacement {
    let config = AnalysisConfig::default();
    let placer = default_placer(&config);
    pole_placement_with(placer.as_deref(), a, b, poles, &config)
}

/// Design a state-feedback gain placing the eigenvalues of `A − B K`.
///
/// # Arguments
///
/// * `placer` - Root-placement algorithm; `None` when unavailable
/// * `a` - N×N state matrix
/// * `b` - N×M input matrix
/// * `poles` - N desired closed-loop eigenvalues; complex poles must come in
///   conjugate pairs for the gain to be real
/// * `config` - Supplies `pole_tolerance` for the verification step
///
/// # Returns
///
/// Never fails. Either
///
/// * `Placed` with `K`, `A − B K` and its eigenvalues, or
/// * `Unavailable` with `BackendMissing` (no placer) or `Failed(err)` where
///   `err` is the shape, controllability, feasibility or accuracy problem.
///
/// Both unavailable cases are logged at `warn` level.
///
/// # Algorithm
///
/// 1. **Shape validation**: `A` square, `B` with N rows
/// 2. **Gain computation**: delegated to `placer`
/// 3. **Verification**: eigenvalues of `A − B K` are recomputed with
///    [`eigenvalues`] and each requested pole is greedily matched to the
///    nearest unused closed-loop eigenvalue. The largest distance must not
///    exceed `config.pole_tolerance · max(1, max |pole|)`.
pub fn pole_placement_with(
    placer: Option<&dyn PolePlacer>,
    a: &Array2<f64>,
    b: &Array2<f64>,
    poles: &[Complex64],
    config: &AnalysisConfig,
) -> PolePlacement {
    let Some(placer) = placer else {
        warn!("pole placement unavailable: no placement algorithm in this build");
        return PolePlacement::Unavailable(Unavailable {
            reason: UnavailableReason::BackendMissing,
        });
    };

    match assign_poles(placer, a, b, poles, config) {
        Ok(assignment) => PolePlacement::Placed(assignment),
        Err(err) => {
            warn!(placer = placer.name(), error = %err, "pole placement failed");
            PolePlacement::Unavailable(Unavailable {
                reason: UnavailableReason::Failed(err),
            })
        }
    }
}

fn assign_poles(
    placer: &dyn PolePlacer,
    a: &Array2<f64>,
    b: &Array2<f64>,
    poles: &[Complex64],
    config: &AnalysisConfig,
) -> ControlResult<PoleAssignment> {
    let n = ensure_square("pole_placement", a)?;
    if b.nrows() != n {
        return Err(ControlError::DimensionMismatch {
            op: "pole_placement",
            left: shape_of(a),
            right: shape_of(b),
        });
    }
    let m = b.ncols();

    let gain = placer.place(a, b, poles)?;
    if gain.shape() != [m, n] {
        return Err(ControlError::DimensionMismatch {
            op: "pole_placement (gain)",
            left: (m, n),
            right: shape_of(&gain),
        });
    }

    let closed_loop = a - &b.dot(&gain);
    let closed_loop_eigenvalues = eigenvalues(&closed_loop)?;
    let max_pole_error = max_matching_distance(poles, &closed_loop_eigenvalues);

    let scale = poles.iter().map(|p| p.norm()).fold(1.0, f64::max);
    let tolerance = config.pole_tolerance * scale;
    debug!(placer = placer.name(), max_pole_error, tolerance, "pole placement verified");
    if max_pole_error.is_nan() || max_pole_error > tolerance {
        return Err(ControlError::PlacementInaccurate {
            error: max_pole_error,
            tolerance,
        });
    }

    Ok(PoleAssignment {
        gain,
        closed_loop,
        closed_loop_eigenvalues,
        requested_poles: poles.iter().copied().collect(),
        max_pole_error,
        placer: placer.name(),
    })
}

/// Greedy matching of requested to achieved poles; returns the largest
/// matched distance.
fn max_matching_distance(requested: &[Complex64], achieved: &Array1<Complex64>) -> f64 {
    let mut used = vec![false; achieved.len()];
    let mut worst: f64 = 0.0;
    for p in requested {
        let nearest = achieved
            .iter()
            .enumerate()
            .filter(|(i, _)| !used[*i])
            .map(|(i, q)| (i, (p - q).norm()))
            .min_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(std::cmp::Ordering::Equal));
        match nearest {
            Some((i, d)) => {
                used[i] = true;
                worst = worst.max(d);
            }
            None => return f64::INFINITY,
        }
    }
    worst
}

#[cfg(feature = "pole-placement")]
pub use ackermann::AckermannPlacer;

#[cfg(feature = "pole-placement")]
mod ackermann {
    use ndarray::{Array1, Array2, Axis};
    use num_complex::Complex64;
    use tracing::debug;

    use super::PolePlacer;
    use crate::analysis::controllability_matrix;
    use crate::config::RankTolerance;
    use crate::error::{shape_of, ControlError, ControlResult};
    use crate::linalg::{
        ensure_square, identity, numerical_rank, singular_values, to_dmatrix, transpose,
    };

    /// Pseudo-random pre-feedbacks tried after `K₀ = 0`.
    const PRE_FEEDBACK_TRIALS: usize = 8;

    /// Fractional part of the golden ratio, for a Weyl sequence.
    const GOLDEN_FRACTION: f64 = 0.618_033_988_749_894_9;

    /// Pole placement by Ackermann's formula.
    ///
    /// **Single input (M = 1)**:
    ///
    /// ```text
    /// K = e_nᵀ 𝒞⁻¹ p(A)
    /// ```
    ///
    /// where `𝒞 = [B AB ... A^(n-1)B]` and `p(s) = Π (s − λᵢ)` is the desired
    /// characteristic polynomial, evaluated at `A` by Horner's scheme.
    ///
    /// **Multiple inputs (M > 1)**: a pre-feedback `K₀` first makes
    /// `A − B K₀` cyclic, then the input space is collapsed onto one
    /// direction `v` for which `(A − B K₀, Bv)` is controllable:
    ///
    /// ```text
    /// K = K₀ + v kᵀ
    /// ```
    ///
    /// with `k` the single-input gain of the reduced pair. `K₀ = 0` is tried
    /// first; if no direction works, deterministic pseudo-random `K₀` follow.
    /// For a controllable pair almost every `K₀` yields a cyclic closed loop
    /// (Heymann's lemma), so non-cyclic `A` such as `A = I` is handled.
    /// Among the candidate directions (unit vectors, the all-ones vector) the
    /// one with the best-conditioned controllability matrix wins.
    ///
    /// Repeated poles are accepted. Complex poles must be closed under
    /// conjugation.
    ///
    /// Ackermann's formula is ill-conditioned for large N; it is intended for
    /// the small models this crate targets.
    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    pub struct AckermannPlacer {
        /// Tolerance for the controllability rank test.
        pub rank_tolerance: RankTolerance,
    }

    impl PolePlacer for AckermannPlacer {
        fn name(&self) -> &'static str {
            "ackermann"
        }

        fn place(
            &self,
            a: &Array2<f64>,
            b: &Array2<f64>,
            poles: &[Complex64],
        ) -> ControlResult<Array2<f64>> {
            let n = ensure_square("ackermann", a)?;
            if b.nrows() != n {
                return Err(ControlError::DimensionMismatch {
                    op: "ackermann",
                    left: shape_of(a),
                    right: shape_of(b),
                });
            }
            if poles.len() != n {
                return Err(ControlError::Infeasible(format!(
                    "expected {} poles for a {}-state system, got {}",
                    n,
                    n,
                    poles.len()
                )));
            }
            let m = b.ncols();
            if n == 0 {
                return Ok(Array2::zeros((m, 0)));
            }

            let coeffs = characteristic_polynomial(poles)?;

            if m == 1 {
                return self.single_input_gain(a, b, &coeffs);
            }

            let full_rank = numerical_rank(&controllability_matrix(a, b)?, self.rank_tolerance)?;
            if full_rank < n {
                return Err(ControlError::Uncontrollable {
                    rank: full_rank,
                    state_dim: n,
                });
            }

            let scale = frobenius_norm(a).max(1.0) / frobenius_norm(b).max(f64::MIN_POSITIVE);
            for trial in 0..=PRE_FEEDBACK_TRIALS {
                let k0 = pre_feedback(trial, m, n, scale);
                let a_k = a - &b.dot(&k0);
                let Some(v) = self.best_input_direction(&a_k, b)? else {
                    continue;
                };
                debug!(trial, ?v, "ackermann: single input direction found");
                let bv = b.dot(&v).insert_axis(Axis(1));
                let k = self.single_input_gain(&a_k, &bv, &coeffs)?;
                return Ok(k0 + &v.insert_axis(Axis(1)).dot(&k));
            }

            Err(ControlError::Infeasible(format!(
                "no input direction made the closed loop cyclic after {} pre-feedback trials",
                PRE_FEEDBACK_TRIALS
            )))
        }
    }

    impl AckermannPlacer {
        /// `K = e_nᵀ 𝒞⁻¹ p(A)` for an N×1 input matrix.
        fn single_input_gain(
            &self,
            a: &Array2<f64>,
            b: &Array2<f64>,
            coeffs: &[f64],
        ) -> ControlResult<Array2<f64>> {
            let n = a.nrows();
            let ctrb = controllability_matrix(a, b)?;
            let rank = numerical_rank(&ctrb, self.rank_tolerance)?;
            if rank < n {
                return Err(ControlError::Uncontrollable { rank, state_dim: n });
            }

            // wᵀ = e_nᵀ 𝒞⁻¹  <=>  𝒞ᵀ w = e_n
            let mut e_n = nalgebra::DVector::zeros(n);
            e_n[n - 1] = 1.0;
            let w = to_dmatrix(&transpose(&ctrb))
                .lu()
                .solve(&e_n)
                .ok_or(ControlError::Singular { op: "ackermann" })?;
            let w: Array1<f64> = w.iter().copied().collect();

            let p_a = evaluate_matrix_polynomial(a, coeffs);
            Ok(w.dot(&p_a).insert_axis(Axis(0)))
        }

        /// Input direction with the best-conditioned controllability matrix
        /// among those making `(a, b v)` controllable.
        fn best_input_direction(
            &self,
            a: &Array2<f64>,
            b: &Array2<f64>,
        ) -> ControlResult<Option<Array1<f64>>> {
            let n = a.nrows();
            let mut best: Option<(f64, Array1<f64>)> = None;
            for v in input_directions(b.ncols()) {
                let bv = b.dot(&v).insert_axis(Axis(1));
                let ctrb = controllability_matrix(a, &bv)?;
                let sv = singular_values(&ctrb)?;
                let sigma_max = sv.first().copied().unwrap_or(0.0);
                let threshold = self.rank_tolerance.threshold(shape_of(&ctrb), sigma_max);
                if sv.iter().filter(|&&s| s > threshold).count() < n {
                    continue;
                }
                let score = sv[n - 1] / sigma_max;
                if best.as_ref().map_or(true, |(s, _)| score > *s) {
                    best = Some((score, v));
                }
            }
            Ok(best.map(|(_, v)| v))
        }
    }

    /// `K₀` for the given trial: zero first, then Weyl-sequence entries in
    /// `[-scale, scale)`.
    fn pre_feedback(trial: usize, m: usize, n: usize, scale: f64) -> Array2<f64> {
        if trial == 0 {
            return Array2::zeros((m, n));
        }
        Array2::from_shape_fn((m, n), |(i, j)| {
            let k = (trial * m * n + i * n + j) as f64 + 1.0;
            scale * ((k * GOLDEN_FRACTION).fract() * 2.0 - 1.0)
        })
    }

    fn frobenius_norm(a: &Array2<f64>) -> f64 {
        a.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Unit vectors, then the normalised all-ones vector.
    fn input_directions(m: usize) -> impl Iterator<Item = Array1<f64>> {
        let units = (0..m).map(move |j| {
            let mut v = Array1::zeros(m);
            v[j] = 1.0;
            v
        });
        let ones = std::iter::once(Array1::from_elem(m, 1.0 / (m as f64).sqrt()));
        units.chain(ones)
    }

    /// Monic coefficients `[c0, c1, ..., c_n]` of `Π (s − λᵢ)` in increasing
    /// powers of `s`.
    ///
    /// # Errors
    ///
    /// `Infeasible` if the poles are not closed under conjugation, i.e. the
    /// polynomial has non-negligible imaginary coefficients.
    pub(super) fn characteristic_polynomial(poles: &[Complex64]) -> ControlResult<Vec<f64>> {
        let n = poles.len();
        let mut coeffs = vec![Complex64::new(0.0, 0.0); n + 1];
        coeffs[0] = Complex64::new(1.0, 0.0);

        // multiply by (s − λ) one root at a time
        for (k, &lambda) in poles.iter().enumerate() {
            for i in (1..=k + 1).rev() {
                coeffs[i] = coeffs[i - 1] - lambda * coeffs[i];
            }
            coeffs[0] = -lambda * coeffs[0];
        }

        let scale = coeffs.iter().map(|c| c.norm()).fold(1.0, f64::max);
        let worst_imag = coeffs.iter().map(|c| c.im.abs()).fold(0.0, f64::max);
        if worst_imag > 1e-9 * scale {
            return Err(ControlError::Infeasible(
                "complex poles must come in conjugate pairs".to_string(),
            ));
        }
        Ok(coeffs.iter().map(|c| c.re).collect())
    }

    /// `p(A) = c_n Aⁿ + ... + c_1 A + c_0 I` by Horner's scheme.
    pub(super) fn evaluate_matrix_polynomial(a: &Array2<f64>, coeffs: &[f64]) -> Array2<f64> {
        let n = a.nrows();
        let eye = identity(n);
        let mut result = Array2::zeros((n, n));
        for &c in coeffs.iter().rev() {
            result = a.dot(&result) + &eye * c;
        }
        result
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use approx::assert_abs_diff_eq;
        use ndarray::array;

        #[test]
        fn test_characteristic_polynomial_real() {
            let c = characteristic_polynomial(&super::super::real_poles(&[-1.0, -2.0])).unwrap();
            assert_eq!(c, vec![2.0, 3.0, 1.0]);
        }

        #[test]
        fn test_characteristic_polynomial_conjugate_pair() {
            let poles = [Complex64::new(-1.0, 2.0), Complex64::new(-1.0, -2.0)];
            let c = characteristic_polynomial(&poles).unwrap();
            assert_abs_diff_eq!(c[0], 5.0, epsilon = 1e-12);
            assert_abs_diff_eq!(c[1], 2.0, epsilon = 1e-12);
            assert_abs_diff_eq!(c[2], 1.0, epsilon = 1e-12);
        }

        #[test]
        fn test_characteristic_polynomial_unpaired_complex() {
            let poles = [Complex64::new(-1.0, 2.0), Complex64::new(-3.0, 0.0)];
            assert!(matches!(
                characteristic_polynomial(&poles),
                Err(ControlError::Infeasible(_))
            ));
        }

        #[test]
        fn test_matrix_polynomial_horner() {
            let a = array![[0.0, 1.0], [0.0, 0.0]];
            // A² + 3A + 2I with A² = 0
            let p = evaluate_matrix_polynomial(&a, &[2.0, 3.0, 1.0]);
            assert_eq!(p, array![[2.0, 3.0], [0.0, 2.0]]);
        }

        #[test]
        fn test_input_directions() {
            let dirs: Vec<_> = input_directions(2).collect();
            assert_eq!(dirs.len(), 3);
            assert_eq!(dirs[0], array![1.0, 0.0]);
            assert_eq!(dirs[1], array![0.0, 1.0]);
            assert_abs_diff_eq!(dirs[2].dot(&dirs[2]), 1.0, epsilon = 1e-12);
        }

        #[test]
        fn test_pre_feedback_sequence() {
            assert_eq!(pre_feedback(0, 2, 3, 5.0), Array2::<f64>::zeros((2, 3)));

            let k1 = pre_feedback(1, 2, 2, 3.0);
            let k2 = pre_feedback(2, 2, 2, 3.0);
            assert!(k1.iter().all(|x| x.abs() <= 3.0));
            assert_ne!(k1, k2);
            // entries pairwise distinct, so K₀ carries no accidental structure
            let mut entries = k1.iter().copied().collect::<Vec<_>>();
            entries.sort_by(|x, y| x.partial_cmp(y).unwrap());
            assert!(entries.windows(2).all(|w| w[1] - w[0] > 1e-3));
        }

        #[test]
        fn test_non_cyclic_identity_gets_pre_feedback() {
            let placer = AckermannPlacer::default();
            let a = Array2::<f64>::eye(2);
            let b = Array2::<f64>::eye(2);
            let k = placer
                .place(&a, &b, &super::super::real_poles(&[-1.0, -2.0]))
                .unwrap();
            let cl = &a - &b.dot(&k);
            // trace and determinant of the closed loop match (s + 1)(s + 2)
            let trace = cl[(0, 0)] + cl[(1, 1)];
            let det = cl[(0, 0)] * cl[(1, 1)] - cl[(0, 1)] * cl[(1, 0)];
            assert_abs_diff_eq!(trace, -3.0, epsilon = 1e-8);
            assert_abs_diff_eq!(det, 2.0, epsilon = 1e-8);
        }

        #[test]
        fn test_wrong_pole_count() {
            let placer = AckermannPlacer::default();
            let err = placer
                .place(
                    &array![[0.0, 1.0], [0.0, 0.0]],
                    &array![[0.0], [1.0]],
                    &super::super::real_poles(&[-1.0]),
                )
                .unwrap_err();
            assert!(matches!(err, ControlError::Infeasible(_)));
        }
    }
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reason {
            UnavailableReason::BackendMissing => {
                write!(f, "no pole-placement algorithm available in this build")
            }
            UnavailableReason::Failed(err) => write!(f, "pole placement failed: {err}"),
        }
    }
}

impl fmt::Display for PoleAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "requested poles: {:.4}", self.requested_poles)?;
        writeln!(f, "gain K ({}):\n{:.4}", self.placer, self.gain)?;
        writeln!(f, "closed loop A - BK:\n{:.4}", self.closed_loop)?;
        write!(
            f,
            "closed-loop eigenvalues: {:.4} (max error {:.2e})",
            self.closed_loop_eigenvalues, self.max_pole_error
        )
    }
}

impl fmt::Display for PolePlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolePlacement::Placed(assignment) => fmt::Display::fmt(assignment, f),
            PolePlacement::Unavailable(u) => fmt::Display::fmt(u, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    /// Placer returning a fixed gain, for exercising the verification path.
    struct FixedGain(Array2<f64>);

    impl PolePlacer for FixedGain {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn place(
            &self,
            _a: &Array2<f64>,
            _b: &Array2<f64>,
            _poles: &[Complex64],
        ) -> ControlResult<Array2<f64>> {
            Ok(self.0.clone())
        }
    }

    fn double_integrator() -> (Array2<f64>, Array2<f64>) {
        (array![[0.0, 1.0], [0.0, 0.0]], array![[0.0], [1.0]])
    }

    #[test]
    fn test_missing_placer_is_unavailable() {
        let (a, b) = double_integrator();
        let outcome = pole_placement_with(
            None,
            &a,
            &b,
            &real_poles(&[-1.0, -2.0]),
            &AnalysisConfig::default(),
        );
        assert!(matches!(
            outcome,
            PolePlacement::Unavailable(Unavailable {
                reason: UnavailableReason::BackendMissing
            })
        ));
        assert!(matches!(
            outcome.into_result(),
            Err(ControlError::Unavailable(_))
        ));
    }

    #[test]
    fn test_fixed_gain_verified() {
        let (a, b) = double_integrator();
        let placer = FixedGain(array![[2.0, 3.0]]);
        let outcome = pole_placement_with(
            Some(&placer),
            &a,
            &b,
            &real_poles(&[-1.0, -2.0]),
            &AnalysisConfig::default(),
        );
        let assignment = outcome.assignment().unwrap();
        assert_eq!(assignment.placer, "fixed");
        assert_eq!(assignment.closed_loop, array![[0.0, 1.0], [-2.0, -3.0]]);
        assert!(assignment.max_pole_error < 1e-9);
    }

    #[test]
    fn test_wrong_gain_rejected_by_verification() {
        let (a, b) = double_integrator();
        let placer = FixedGain(array![[1.0, 1.0]]);
        let outcome = pole_placement_with(
            Some(&placer),
            &a,
            &b,
            &real_poles(&[-1.0, -2.0]),
            &AnalysisConfig::default(),
        );
        assert!(matches!(
            outcome,
            PolePlacement::Unavailable(Unavailable {
                reason: UnavailableReason::Failed(ControlError::PlacementInaccurate { .. })
            })
        ));
    }

    #[test]
    fn test_gain_shape_checked() {
        let (a, b) = double_integrator();
        let placer = FixedGain(array![[1.0], [1.0]]);
        let outcome = pole_placement_with(
            Some(&placer),
            &a,
            &b,
            &real_poles(&[-1.0, -2.0]),
            &AnalysisConfig::default(),
        );
        assert!(matches!(
            outcome,
            PolePlacement::Unavailable(Unavailable {
                reason: UnavailableReason::Failed(ControlError::DimensionMismatch { .. })
            })
        ));
    }

    #[test]
    fn test_shape_errors_are_not_fatal() {
        let placer = FixedGain(array![[0.0, 0.0]]);
        let outcome = pole_placement_with(
            Some(&placer),
            &array![[0.0, 1.0]],
            &array![[1.0]],
            &real_poles(&[-1.0]),
            &AnalysisConfig::default(),
        );
        assert!(!outcome.is_placed());
    }

    #[test]
    fn test_max_matching_distance() {
        let achieved = Array1::from(vec![Complex64::new(-2.0, 0.0), Complex64::new(-1.0, 0.0)]);
        let d = max_matching_distance(&real_poles(&[-1.0, -2.1]), &achieved);
        assert!((d - 0.1).abs() < 1e-12);
    }

    #[cfg(feature = "pole-placement")]
    #[test]
    fn test_ackermann_double_integrator() {
        let (a, b) = double_integrator();
        let assignment = pole_placement(&a, &b, &real_poles(&[-1.0, -2.0]))
            .into_result()
            .unwrap();
        assert!((assignment.gain[(0, 0)] - 2.0).abs() < 1e-10);
        assert!((assignment.gain[(0, 1)] - 3.0).abs() < 1e-10);
        assert_eq!(assignment.placer, "ackermann");
    }

    #[cfg(feature = "pole-placement")]
    #[test]
    fn test_ackermann_uncontrollable() {
        let a = array![[1.0, 0.0], [0.0, 2.0]];
        let b = array![[0.0], [0.0]];
        let outcome = pole_placement(&a, &b, &real_poles(&[-1.0, -2.0]));
        assert!(matches!(
            outcome,
            PolePlacement::Unavailable(Unavailable {
                reason: UnavailableReason::Failed(ControlError::Uncontrollable {
                    rank: 0,
                    state_dim: 2
                })
            })
        ));
    }

    #[cfg(not(feature = "pole-placement"))]
    #[test]
    fn test_default_placer_missing_without_feature() {
        let (a, b) = double_integrator();
        assert!(default_placer(&AnalysisConfig::default()).is_none());
        assert!(!pole_placement(&a, &b, &real_poles(&[-1.0, -2.0])).is_placed());
    }
}
