//! Numerical tolerances used by the analysis and synthesis routines.
//!
//! Every threshold the crate applies is spelled out here instead of being
//! buried in a routine, so near-degenerate systems are classified by a value
//! the caller can see and change.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Threshold below which a singular value counts as zero for rank estimation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RankTolerance {
    /// `σ_max · max(rows, cols) · f64::EPSILON`, scaled to the matrix.
    #[default]
    Relative,
    /// Fixed threshold independent of the matrix.
    Absolute { value: f64 },
}

impl RankTolerance {
    /// Resolve the threshold for a matrix of the given shape and largest
    /// singular value.
    pub fn threshold(&self, shape: (usize, usize), sigma_max: f64) -> f64 {
        match *self {
            RankTolerance::Relative => sigma_max * shape.0.max(shape.1) as f64 * f64::EPSILON,
            RankTolerance::Absolute { value } => value,
        }
    }
}

/// Runtime configuration for analysis and pole placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rank threshold for controllability / observability.
    /// Default: relative.
    pub rank_tolerance: RankTolerance,

    /// Relative determinant `|det A| / Π‖row_i‖` at or below which a matrix
    /// is treated as singular.
    /// Default: 1e-12.
    pub singularity_tolerance: f64,

    /// Allowed distance between requested and achieved closed-loop poles,
    /// relative to `max(1, max |pole|)`.
    /// Default: 1e-6.
    pub pole_tolerance: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            rank_tolerance: RankTolerance::Relative,
            singularity_tolerance: 1e-12,
            pole_tolerance: 1e-6,
        }
    }
}

impl AnalysisConfig {
    /// Validate all fields are within acceptable ranges.
    pub fn validate(&self) -> ControlResult<()> {
        if let RankTolerance::Absolute { value } = self.rank_tolerance {
            if !value.is_finite() || value < 0.0 {
                return Err(ControlError::Config(format!(
                    "rank_tolerance.value must be finite and >= 0, got {value}"
                )));
            }
        }
        if !self.singularity_tolerance.is_finite() || self.singularity_tolerance < 0.0 {
            return Err(ControlError::Config(format!(
                "singularity_tolerance must be finite and >= 0, got {}",
                self.singularity_tolerance
            )));
        }
        if !self.pole_tolerance.is_finite() || self.pole_tolerance <= 0.0 {
            return Err(ControlError::Config(format!(
                "pole_tolerance must be finite and > 0, got {}",
                self.pole_tolerance
            )));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> ControlResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ControlError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> ControlResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
