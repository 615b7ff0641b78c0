//! Controllability and observability of a few small systems, including
//! pairs that lose rank.

use ndarray::{arr2, Array2};
use statespace_rs::analysis::{check_controllability, check_observability};
use statespace_rs::config::RankTolerance;
use statespace_rs::ControlResult;

fn analyse(label: &str, a: &Array2<f64>, b: &Array2<f64>, c: &Array2<f64>) -> ControlResult<()> {
    println!("--- {label} ---");
    let ctrb = check_controllability(a, b, RankTolerance::default())?;
    let obsv = check_observability(a, c, RankTolerance::default())?;
    println!("{ctrb}\n");
    println!("{obsv}\n");
    Ok(())
}

fn main() -> ControlResult<()> {
    println!("=== Structural Checks ===\n");

    // Chain of integrators, fully controllable and observable
    analyse(
        "triple integrator",
        &arr2(&[[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 0.0]]),
        &arr2(&[[0.0], [0.0], [1.0]]),
        &arr2(&[[1.0, 0.0, 0.0]]),
    )?;

    // Decoupled modes: input reaches only the first, output sees only the second
    analyse(
        "decoupled modes",
        &arr2(&[[-1.0, 0.0], [0.0, -2.0]]),
        &arr2(&[[1.0], [0.0]]),
        &arr2(&[[0.0, 1.0]]),
    )?;

    // Weak coupling: controllable in exact arithmetic, rank depends on tolerance
    let a = arr2(&[[-1.0, 1e-9], [0.0, -2.0]]);
    let b = arr2(&[[0.0], [1.0]]);
    for tol in [RankTolerance::Relative, RankTolerance::Absolute { value: 1e-6 }] {
        let check = check_controllability(&a, &b, tol)?;
        println!(
            "weak coupling with {:?}: rank {} -> controllable: {}",
            tol, check.rank, check.is_controllable
        );
    }

    Ok(())
}
