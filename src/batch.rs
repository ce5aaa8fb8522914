//! Convergence-gated batch EM.
//!
//! The M-step here is the closed-form maximum-likelihood update under the
//! expected complete-data counts of a full E-step. It needs the whole dataset
//! in memory and serves as the exact reference the online estimator
//! approximates.

use crate::encode::IndicatorMatrix;
use crate::error::{MotifError, Result};
use crate::model::{background_matrix, MixtureModel};
use crate::posterior::{expectation, ExpectedCounts};
use crate::types::ALPHABET_SIZE;
use ndarray::{concatenate, s, Array2, Axis};
use serde::Serialize;
use tracing::{debug, info};

/// Closed-form M-step.
///
/// Stacks `c0` above `c` into a (W+1)×4 count matrix and normalizes each row
/// by its own sum: row 0 becomes the background distribution, rows 1..=W the
/// motif PWM. `λ` becomes `ΣZ / n`. A row without expected counts keeps the
/// corresponding row of `previous`.
pub fn maximization(counts: &ExpectedCounts, n: usize, previous: &MixtureModel) -> MixtureModel {
    if n == 0 {
        return previous.clone();
    }
    let width = counts.c.nrows();

    let augmented = concatenate![Axis(0), counts.c0.view().insert_axis(Axis(0)), counts.c.view()];
    let mut f = Array2::<f64>::zeros((width + 1, ALPHABET_SIZE));
    for (i, row) in augmented.outer_iter().enumerate() {
        let total = row.sum();
        if total > 0.0 {
            f.row_mut(i).assign(&(&row / total));
        } else if i == 0 {
            f.row_mut(0).assign(&previous.background.row(0));
        } else {
            f.row_mut(i).assign(&previous.motif.row(i - 1));
        }
    }

    let lambda = (counts.total_z() / n as f64).clamp(0.0, 1.0);
    let motif = f.slice(s![1.., ..]).to_owned();
    let background = background_matrix(f.row(0), width);

    MixtureModel::from_parts(lambda, motif, background)
}

/// Euclidean distance between two matrices of the same shape
pub fn distance(u: &Array2<f64>, v: &Array2<f64>) -> f64 {
    (u - v).mapv(|w| w * w).sum().sqrt()
}

/// Result of a batch fit
#[derive(Debug, Clone, Serialize)]
pub struct BatchFit {
    pub model: MixtureModel,
    /// Number of E/M iterations performed
    pub iterations: usize,
    /// Whether the motif moved less than the tolerance on the last iteration
    pub converged: bool,
}

/// Batch EM with a convergence tolerance and an iteration cap
#[derive(Debug, Clone, Copy)]
pub struct BatchEm {
    tolerance: f64,
    max_iterations: usize,
}

impl BatchEm {
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self> {
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
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    /// Iterates E-step and M-step until the distance between successive motif
    /// PWMs drops below the tolerance or the iteration cap is hit.
    ///
    /// An empty dataset returns `initial` unchanged after zero iterations.
    ///
    /// # Errors
    /// * `MotifError::InvalidSequence` for the first sequence whose width
    ///   differs from the model width
    pub fn fit(&self, indicators: &[IndicatorMatrix], initial: MixtureModel) -> Result<BatchFit> {
        if indicators.is_empty() {
            info!("no sequences to fit, returning initial model");
            return Ok(BatchFit {
                model: initial,
                iterations: 0,
                converged: true,
            });
        }

        let n = indicators.len();
        let mut model = initial;
        let mut converged = false;
        let mut iterations = 0;

        for k in 0..self.max_iterations {
            iterations = k + 1;
            let counts = expectation(indicators, &model)?;
            let next = maximization(&counts, n, &model);
            let moved = distance(&next.motif, &model.motif);
            debug!(iteration = iterations, lambda = next.lambda, moved, "batch EM step");
            model = next;
            if moved < self.tolerance {
                converged = true;
                break;
            }
        }

        info!(sequences = n, iterations, converged, lambda = model.lambda, "batch EM finished");
        Ok(BatchFit {
            model,
            iterations,
            converged,
        })
    }
}
