use crate::error::{MotifError, Result};
use crate::model::validate_lambda;
use crate::online::DEFAULT_STEP;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How the mixture model is fitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FitMode {
    /// One streaming pass of online EM
    #[default]
    Online,
    /// Full-dataset EM iterated until the motif stops moving
    Batch {
        #[serde(default = "default_tolerance")]
        tolerance: f64,
        #[serde(default = "default_max_iterations")]
        max_iterations: usize,
    },
}

/// Batch EM convergence tolerance when none is given
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Batch EM iteration cap when none is given
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

impl FitMode {
    /// Batch mode with the default tolerance and iteration cap
    pub fn batch() -> Self {
        FitMode::Batch {
            tolerance: DEFAULT_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Options recognized by a motif discovery run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmConfig {
    /// Motif width W; every sequence must have exactly this length
    pub width: usize,
    /// Number of motifs to search for. Only one motif is fitted per run.
    pub num_motifs: usize,
    /// Online step size in (0, 1]
    pub step: f64,
    /// Initial mixture weight λ₀
    pub initial_lambda: f64,
    /// Worker threads for the batch E-step
    pub processes: Option<usize>,
    /// Drop malformed sequences instead of failing the run
    pub skip_invalid: bool,
    pub mode: FitMode,
}

impl Default for EmConfig {
    fn default() -> Self {
        Self {
            width: 10,
            num_motifs: 1,
            step: DEFAULT_STEP,
            initial_lambda: 0.5,
            processes: None,
            skip_invalid: false,
            mode: FitMode::Online,
        }
    }
}

impl EmConfig {
    /// Reads a TOML config file; absent keys take their default value.
    ///
    /// # Errors
    /// * `MotifError::Io` if the file cannot be read
    /// * `MotifError::Config` if it is not valid TOML for this structure
    /// * any error from [`EmConfig::validate`]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: EmConfig = toml::from_str(text).map_err(|e| MotifError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every option against its allowed range
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(MotifError::invalid_parameter(
                "width",
                self.width,
                "must be positive",
            ));
        }
        if self.num_motifs == 0 {
            return Err(MotifError::invalid_parameter(
                "num_motifs",
                self.num_motifs,
                "must be positive",
            ));
        }
        if !(self.step > 0.0 && self.step <= 1.0) {
            return Err(MotifError::invalid_parameter(
                "step",
                self.step,
                "must lie in (0, 1]",
            ));
        }
        validate_lambda(self.initial_lambda)?;
        if self.processes == Some(0) {
            return Err(MotifError::invalid_parameter(
                "processes",
                0,
                "must be positive",
            ));
        }
        if let FitMode::Batch {
            tolerance,
            max_iterations,
        } = self.mode
        {
            if !(tolerance > 0.0 && tolerance.is_finite()) {
                return Err(MotifError::invalid_parameter(
                    "tolerance",
                    tolerance,
                    "must be positive and finite",
                ));
            }
            if max_iterations == 0 {
                return Err(MotifError::invalid_parameter(
                    "max_iterations",
                    max_iterations,
                    "must be at least 1",
                ));
            }
        }
        Ok(())
    }
}
