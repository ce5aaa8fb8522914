//! E-step: posterior probability that a sequence was generated by the motif.

use crate::encode::IndicatorMatrix;
use crate::error::{MotifError, Result};
use crate::model::{log_likelihood, MixtureModel};
use crate::types::ALPHABET_SIZE;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use tracing::warn;

/// Responsibility Z from raw component likelihoods and the mixture weight.
///
/// Computes `a = a_raw·λ`, `b = b_raw·(1−λ)`, `Z = a / (a + b)`. When both
/// terms vanish the posterior is undefined and `λ` is returned instead.
pub fn responsibility(a_raw: f64, b_raw: f64, lambda: f64) -> f64 {
    responsibility_from_logs(a_raw.ln(), b_raw.ln(), lambda)
}

/// Responsibility Z from component log-likelihoods.
///
/// Same contract as [`responsibility`], but the likelihoods never leave log
/// space, so long motifs do not underflow to a degenerate 0/0.
pub fn responsibility_from_logs(log_a_raw: f64, log_b_raw: f64, lambda: f64) -> f64 {
    let log_a = log_a_raw + lambda.ln();
    let log_b = log_b_raw + (1.0 - lambda).ln();

    match (log_a == f64::NEG_INFINITY, log_b == f64::NEG_INFINITY) {
        (true, true) => {
            warn!(lambda, "both component likelihoods are zero, falling back to lambda");
            lambda
        }
        (true, false) => 0.0,
        (false, true) => 1.0,
        // logistic of the log-odds, kept in [0, 1]
        (false, false) => (1.0 / (1.0 + (log_b - log_a).exp())).clamp(0.0, 1.0),
    }
}

/// Responsibility of the motif component for one encoded sequence
///
/// # Errors
/// * `MotifError::InvalidInput` if the sequence width differs from the model width
pub fn sequence_responsibility(indicator: &IndicatorMatrix, model: &MixtureModel) -> Result<f64> {
    Ok(responsibility_from_logs(
        log_likelihood(indicator, &model.motif)?,
        log_likelihood(indicator, &model.background)?,
        model.lambda,
    ))
}

/// Expected sufficient statistics gathered by a full E-step
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedCounts {
    /// Responsibility of every sequence, in input order
    pub z: Vec<f64>,
    /// Expected background letter counts (length 4)
    pub c0: Array1<f64>,
    /// Expected motif letter counts per position (W×4)
    pub c: Array2<f64>,
}

impl ExpectedCounts {
    /// Expected number of motif occurrences, the sum of all Z
    pub fn total_z(&self) -> f64 {
        self.z.iter().sum()
    }
}

/// Runs the E-step over a dataset.
///
/// Responsibilities are independent per sequence and computed in parallel;
/// counts are then accumulated in input order so results are reproducible.
///
/// # Errors
/// * `MotifError::InvalidSequence` at the index of the first sequence whose
///   width differs from the model width
pub fn expectation(indicators: &[IndicatorMatrix], model: &MixtureModel) -> Result<ExpectedCounts> {
    if let Some(bad) = indicators.iter().position(|i| i.width() != model.width()) {
        return Err(MotifError::invalid_sequence(
            bad,
            format!(
                "width {} does not match model width {}",
                indicators[bad].width(),
                model.width()
            ),
        ));
    }

    let z: Vec<f64> = indicators
        .par_iter()
        .map(|indicator| sequence_responsibility(indicator, model))
        .collect::<Result<_>>()?;

    let mut c0 = Array1::<f64>::zeros(ALPHABET_SIZE);
    let mut c = Array2::<f64>::zeros((model.width(), ALPHABET_SIZE));
    for (&zi, indicator) in z.iter().zip(indicators) {
        c0.scaled_add(1.0 - zi, &indicator.letter_counts());
        c.scaled_add(zi, &indicator.to_f64());
    }

    Ok(ExpectedCounts { z, c0, c })
}
