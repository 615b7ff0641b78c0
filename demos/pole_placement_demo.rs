//! Demonstration of pole placement
//!
//! Designs state-feedback gains for a double integrator (real poles) and a
//! lightly damped oscillator (complex conjugate poles), then verifies the
//! closed-loop eigenvalues.

use ndarray::arr2;
use num_complex::Complex64;
use statespace_rs::eigen::eigenvalues;
use statespace_rs::synthesis::{pole_placement, real_poles, PolePlacement};

fn report(outcome: &PolePlacement) {
    match outcome {
        PolePlacement::Placed(result) => {
            println!("\n=== Controller Design Results ===");
            println!("Feedback matrix K ({}):", result.placer);
            for i in 0..result.gain.nrows() {
                print!("  [");
                for j in 0..result.gain.ncols() {
                    print!("{:8.4}", result.gain[(i, j)]);
                }
                println!(" ]");
            }

            println!("\nClosed-loop matrix A - BK:");
            println!("{:.4}", result.closed_loop);

            println!("\nActual closed-loop eigenvalues:");
            for eig in result.closed_loop_eigenvalues.iter() {
                println!("  λ = {:.4} + {:.4}i", eig.re, eig.im);
            }
            println!("\nLargest pole error: {:.2e}", result.max_pole_error);
        }
        PolePlacement::Unavailable(u) => {
            println!("\nPole placement unavailable: {u}");
        }
    }
}

fn main() {
    println!("=== Pole Placement Demonstration ===\n");

    // Double integrator
    // dx1/dt = x2
    // dx2/dt = u
    let a = arr2(&[[0.0, 1.0], [0.0, 0.0]]);
    let b = arr2(&[[0.0], [1.0]]);

    println!("Double integrator:");
    println!("A = \n{:?}", a);
    println!("B = \n{:?}", b);

    if let Ok(eigs) = eigenvalues(&a) {
        println!("\nOpen-loop eigenvalues:");
        for eig in eigs.iter() {
            println!("  λ = {:.4}", eig.re);
        }
    }

    let desired = [-1.0, -2.0];
    println!("\nDesired eigenvalues: {:?}", desired);
    report(&pole_placement(&a, &b, &real_poles(&desired)));

    // Undamped oscillator, placed at -1 ± 2i
    let a = arr2(&[[0.0, 1.0], [-4.0, 0.0]]);
    let b = arr2(&[[0.0], [1.0]]);
    let desired = [Complex64::new(-1.0, 2.0), Complex64::new(-1.0, -2.0)];

    println!("\n\nOscillator:");
    println!("A = \n{:?}", a);
    println!("\nDesired eigenvalues: -1 ± 2i");
    report(&pole_placement(&a, &b, &desired));

    // A single complex pole without its conjugate has no real gain
    println!("\n\nUnpaired complex pole:");
    let desired = [Complex64::new(-1.0, 2.0), Complex64::new(-3.0, 0.0)];
    report(&pole_placement(&a, &b, &desired));
}
