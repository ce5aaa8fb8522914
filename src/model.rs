use crate::encode::IndicatorMatrix;
use crate::error::{MotifError, Result};
use crate::types::{LetterDistribution, ALPHABET, ALPHABET_SIZE, PWM, ROW_SUM_TOLERANCE};
use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Two-component mixture of a motif PWM and a position-independent background.
///
/// The background is stored as a W×4 matrix whose rows are all identical, so
/// that both components are evaluated the same way against an indicator
/// matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixtureModel {
    /// Prior probability that a sequence comes from the motif component
    pub lambda: f64,
    /// Motif PWM, W×4
    pub motif: PWM,
    /// Background matrix, W×4 with identical rows
    pub background: PWM,
}

impl MixtureModel {
    /// Builds a model from user-supplied parameters, validating every invariant.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` if `lambda` is outside [0, 1]
    /// * `MotifError::InvalidPwm` if a matrix is not W×4, has entries outside
    ///   [0, 1], has a row that does not sum to 1, or if the background rows differ
    pub fn new(lambda: f64, motif: PWM, background: PWM) -> Result<Self> {
        validate_lambda(lambda)?;
        validate_pwm(&motif, "motif")?;
        validate_pwm(&background, "background")?;

        if motif.dim() != background.dim() {
            return Err(MotifError::invalid_pwm(format!(
                "motif is {:?} but background is {:?}",
                motif.dim(),
                background.dim()
            )));
        }
        let first = background.row(0);
        for (i, row) in background.outer_iter().enumerate().skip(1) {
            if row
                .iter()
                .zip(first.iter())
                .any(|(a, b)| (a - b).abs() > ROW_SUM_TOLERANCE)
            {
                return Err(MotifError::invalid_pwm(format!(
                    "background row {} differs from row 0",
                    i
                )));
            }
        }

        Ok(Self {
            lambda,
            motif,
            background,
        })
    }

    /// Builds a model with a uniform background (every letter 0.25 at every position)
    pub fn with_uniform_background(lambda: f64, motif: PWM) -> Result<Self> {
        let width = motif.nrows();
        Self::new(lambda, motif, uniform_background(width))
    }

    /// Assembles a model from estimator output without re-validating.
    ///
    /// Online updates leave motif rows only approximately normalized, so the
    /// strict checks of [`MixtureModel::new`] do not apply here.
    pub(crate) fn from_parts(lambda: f64, motif: PWM, background: PWM) -> Self {
        Self {
            lambda,
            motif,
            background,
        }
    }

    /// Motif width W
    pub fn width(&self) -> usize {
        self.motif.nrows()
    }

    /// The single background distribution replicated in every background row
    pub fn background_distribution(&self) -> LetterDistribution {
        self.background.row(0).to_owned()
    }

    /// The motif PWM with each row divided by its own sum.
    ///
    /// Rows summing to zero are replaced by the uniform distribution.
    pub fn normalized_motif(&self) -> PWM {
        let mut pwm = self.motif.clone();
        for mut row in pwm.outer_iter_mut() {
            let total = row.sum();
            if total > 0.0 {
                row.mapv_inplace(|p| p / total);
            } else {
                row.fill(1.0 / ALPHABET_SIZE as f64);
            }
        }
        pwm
    }

    /// P(X | motif) for an encoded sequence
    pub fn motif_likelihood(&self, indicator: &IndicatorMatrix) -> Result<f64> {
        motif_likelihood(indicator, &self.motif)
    }

    /// P(X | background) for an encoded sequence
    pub fn background_likelihood(&self, indicator: &IndicatorMatrix) -> Result<f64> {
        background_likelihood(indicator, &self.background)
    }
}

impl fmt::Display for MixtureModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "lambda: {:.6}", self.lambda)?;
        writeln!(f, "motif:")?;
        write_matrix(f, &self.motif)?;
        writeln!(f, "background:")?;
        write_matrix(f, &self.background)
    }
}

fn write_matrix(f: &mut fmt::Formatter<'_>, matrix: &Array2<f64>) -> fmt::Result {
    let header: Vec<String> = ALPHABET.iter().map(|c| format!("{:>9}", c)).collect();
    writeln!(f, "     {}", header.join(""))?;
    for (i, row) in matrix.outer_iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|p| format!("{:>9.5}", p)).collect();
        writeln!(f, "{:>4} {}", i + 1, cells.join(""))?;
    }
    Ok(())
}

/// Uniform background matrix of the given width
pub fn uniform_background(width: usize) -> PWM {
    Array2::from_elem((width, ALPHABET_SIZE), 1.0 / ALPHABET_SIZE as f64)
}

/// Replicates a single letter distribution across `width` rows
pub fn background_matrix(distribution: ArrayView1<f64>, width: usize) -> PWM {
    Array2::from_shape_fn((width, distribution.len()), |(_, j)| distribution[j])
}

/// Log-probability of the encoded sequence under a probability matrix.
///
/// Sums the log of the one entry the indicator selects in each row. Returns
/// `f64::NEG_INFINITY` as soon as a selected probability is zero.
///
/// # Errors
/// * `MotifError::InvalidInput` if the matrix is not W×4 for the indicator's width W
pub fn log_likelihood(indicator: &IndicatorMatrix, pwm: &PWM) -> Result<f64> {
    if pwm.dim() != (indicator.width(), ALPHABET_SIZE) {
        return Err(MotifError::InvalidInput(format!(
            "sequence of width {} cannot be scored against a {:?} matrix",
            indicator.width(),
            pwm.dim()
        )));
    }
    Ok(indicator
        .columns()
        .iter()
        .zip(pwm.outer_iter())
        .map(|(&col, row)| row[col].ln())
        .sum())
}

/// P(X | θ_motif): product over positions of the probability of the observed letter
pub fn motif_likelihood(indicator: &IndicatorMatrix, motif: &PWM) -> Result<f64> {
    Ok(log_likelihood(indicator, motif)?.exp())
}

/// P(X | θ_background): same computation against the background matrix
pub fn background_likelihood(indicator: &IndicatorMatrix, background: &PWM) -> Result<f64> {
    Ok(log_likelihood(indicator, background)?.exp())
}

/// Collapses W×4 expected counts into one normalized letter distribution.
///
/// Returns `None` when the counts carry no mass.
pub fn collapse_counts(counts: &Array2<f64>) -> Option<Array1<f64>> {
    let column_sums = counts.sum_axis(Axis(0));
    let total = column_sums.sum();
    if total > 0.0 && total.is_finite() {
        Some(column_sums / total)
    } else {
        None
    }
}

pub(crate) fn validate_lambda(lambda: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&lambda) {
        return Err(MotifError::invalid_parameter(
            "lambda",
            lambda,
            "must lie in [0, 1]",
        ));
    }
    Ok(())
}

/// Checks that a matrix is W×4 with rows that are probability distributions
pub fn validate_pwm(pwm: &PWM, name: &str) -> Result<()> {
    if pwm.nrows() == 0 || pwm.ncols() != ALPHABET_SIZE {
        return Err(MotifError::invalid_pwm(format!(
            "{} must be W×{} with W > 0, got {:?}",
            name,
            ALPHABET_SIZE,
            pwm.dim()
        )));
    }
    for (i, row) in pwm.outer_iter().enumerate() {
        if row.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(MotifError::invalid_pwm(format!(
                "{} row {} has entries outside [0, 1]",
                name, i
            )));
        }
        let total = row.sum();
        if (total - 1.0).abs() > ROW_SUM_TOLERANCE {
            return Err(MotifError::invalid_pwm(format!(
                "{} row {} sums to {} instead of 1",
                name, i, total
            )));
        }
    }
    Ok(())
}
