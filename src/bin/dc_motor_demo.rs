//! DC motor walkthrough: matrix algebra, stability, structural checks and
//! pole placement on the reference motor model.
//!
//! ```text
//! cargo run --bin dc-motor-demo -- [--config demo.toml] [-v]
//! ```
//!
//! The optional config file accepts the tolerance keys of `AnalysisConfig`
//! under `[analysis]`, motor parameters under `[motor]` and a
//! `desired_poles` array. A pole is either a number or an `[re, im]` pair:
//!
//! ```toml
//! desired_poles = [-20.0, [-5.0, 5.0], [-5.0, -5.0]]
//! ```
//!
//! A failing section is reported and the walkthrough moves on to the next
//! one; the exit code is non-zero if any section failed.

use std::fmt::Display;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use ndarray::array;
use serde::Deserialize;
use num_complex::Complex64;
use tracing::{error, info, warn, Level};

use statespace_rs::analysis::{check_controllability, check_observability};
use statespace_rs::eigen::check_stability;
use statespace_rs::linalg::matrix_operations;
use statespace_rs::synthesis::{default_placer, pole_placement_with};
use statespace_rs::{AnalysisConfig, ControlError, ControlResult, DcMotorParams};

#[derive(Debug, Parser)]
#[command(
    name = "dc-motor-demo",
    about = "State-space analysis and pole placement for a DC motor",
    version
)]
struct Cli {
    /// Path to a TOML file overriding tolerances, motor parameters and poles
    #[arg(long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct DemoConfig {
    analysis: AnalysisConfig,
    motor: DcMotorParams,
    desired_poles: Vec<PoleSpec>,
}

/// One desired pole as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
enum PoleSpec {
    Real(f64),
    Complex([f64; 2]),
}

impl From<PoleSpec> for Complex64 {
    fn from(pole: PoleSpec) -> Self {
        match pole {
            PoleSpec::Real(re) => Complex64::new(re, 0.0),
            PoleSpec::Complex([re, im]) => Complex64::new(re, im),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            motor: DcMotorParams {
                j: 0.01,
                b: 0.1,
                kt: 0.1,
                ke: 0.1,
                r: 1.0,
                l: 0.1,
            },
            desired_poles: vec![PoleSpec::Real(-10.0), PoleSpec::Real(-20.0)],
        }
    }
}

impl DemoConfig {
    fn load(path: &Path) -> ControlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text).map_err(|e| ControlError::Config(e.to_string()))?;
        config.analysis.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let config = match &cli.config {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            match DemoConfig::load(path) {
                Ok(config) => config,
                Err(e) => {
                    error!(error = %e, "dc-motor-demo failed");
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            }
        }
        None => DemoConfig::default(),
    };

    match run(&config, &mut io::stdout().lock()) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            error!(failed, "dc-motor-demo finished with failing sections");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Print one section; an error is printed in place of the result.
/// Returns whether the section succeeded.
fn section<T: Display>(
    out: &mut impl Write,
    title: &str,
    result: ControlResult<T>,
) -> io::Result<bool> {
    writeln!(out, "\n=== {title} ===\n")?;
    match result {
        Ok(value) => {
            writeln!(out, "{value}")?;
            Ok(true)
        }
        Err(e) => {
            warn!(section = title, error = %e, "section failed");
            writeln!(out, "error: {e}")?;
            Ok(false)
        }
    }
}

/// Run every section of the walkthrough and return how many failed.
fn run(config: &DemoConfig, out: &mut impl Write) -> io::Result<usize> {
    writeln!(out, "=== Matrix operations ===\n")?;
    let a = array![[1.0, 2.0], [3.0, 4.0]];
    let b = array![[5.0, 6.0], [7.0, 8.0]];
    writeln!(out, "A =\n{a}\nB =\n{b}\n")?;
    writeln!(out, "{}", matrix_operations(&a, &b, &config.analysis))?;

    writeln!(out, "\n=== DC motor model ===\n")?;
    let m = config.motor;
    writeln!(
        out,
        "J = {}, b = {}, Kt = {}, Ke = {}, R = {}, L = {}\n",
        m.j, m.b, m.kt, m.ke, m.r, m.l
    )?;
    let sys = m.state_space();
    writeln!(out, "{sys}")?;

    let tolerance = config.analysis.rank_tolerance;
    let passed = [
        section(out, "Stability", check_stability(&sys.a))?,
        section(out, "Controllability", check_controllability(&sys.a, &sys.b, tolerance))?,
        section(out, "Observability", check_observability(&sys.a, &sys.c, tolerance))?,
    ];

    writeln!(out, "\n=== Pole placement ===\n")?;
    let poles: Vec<Complex64> = config.desired_poles.iter().map(|&p| p.into()).collect();
    let placer = default_placer(&config.analysis);
    let outcome = pole_placement_with(placer.as_deref(), &sys.a, &sys.b, &poles, &config.analysis);
    writeln!(out, "{outcome}")?;

    Ok(passed.iter().filter(|ok| !**ok).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_config_defaults_fill_missing_sections() {
        let config: DemoConfig = toml::from_str("desired_poles = [-5.0, -6.0]\n").unwrap();
        assert_eq!(
            config.desired_poles,
            vec![PoleSpec::Real(-5.0), PoleSpec::Real(-6.0)]
        );
        assert_eq!(config.motor, DemoConfig::default().motor);
        assert_eq!(config.analysis, AnalysisConfig::default());
    }

    #[test]
    fn test_demo_config_motor_override() {
        let text = "[motor]\nj = 0.02\nb = 0.1\nkt = 0.1\nke = 0.1\nr = 1.0\nl = 0.5\n";
        let config: DemoConfig = toml::from_str(text).unwrap();
        assert_eq!(config.motor.j, 0.02);
        assert_eq!(config.motor.l, 0.5);
    }

    #[test]
    fn test_cli_parses_verbosity() {
        let cli = Cli::parse_from(["dc-motor-demo", "-vv", "--config", "demo.toml"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("demo.toml")));
    }

    #[test]
    fn test_demo_config_complex_poles() {
        let text = "desired_poles = [-20.0, [-5.0, 5.0], [-5.0, -5.0]]\n";
        let config: DemoConfig = toml::from_str(text).unwrap();
        let poles: Vec<Complex64> = config.desired_poles.iter().map(|&p| p.into()).collect();
        assert_eq!(
            poles,
            vec![
                Complex64::new(-20.0, 0.0),
                Complex64::new(-5.0, 5.0),
                Complex64::new(-5.0, -5.0)
            ]
        );
    }

    #[test]
    fn test_demo_places_complex_poles() {
        let config: DemoConfig =
            toml::from_str("desired_poles = [[-5.0, 5.0], [-5.0, -5.0]]\n").unwrap();
        let mut out = Vec::new();
        assert_eq!(run(&config, &mut out).unwrap(), 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("gain K (ackermann)"));
    }

    #[test]
    fn test_failing_sections_do_not_stop_the_walkthrough() {
        // L = 0 makes A and B non-finite, so every check fails
        let mut config = DemoConfig::default();
        config.motor.l = 0.0;
        let mut out = Vec::new();
        let failed = run(&config, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(failed, 3);
        assert_eq!(text.matches("error:").count(), 3);
        for title in ["Stability", "Controllability", "Observability", "Pole placement"] {
            assert!(text.contains(&format!("=== {title} ===")), "missing {title}");
        }
        assert!(text.contains("pole placement failed"));
    }
}
