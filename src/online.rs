//! Single-pass stochastic-approximation EM.
//!
//! The estimator keeps three running sufficient statistics:
//! * `s1_1`, the running estimate of λ
//! * `s1_2`, the W×4 letter counts attributed to the motif
//! * `s2_2`, the W×4 letter counts attributed to the background
//!
//! Each observed sequence moves every statistic toward its one-sequence
//! estimate with `s ← s + step·(ds − s)`, after which the model parameters are
//! re-derived from the statistics.

use crate::encode::IndicatorMatrix;
use crate::error::{MotifError, Result};
use crate::model::{background_matrix, collapse_counts, MixtureModel};
use crate::posterior::sequence_responsibility;
use crate::types::PWM;
use tracing::{debug, info};

/// Step size used by the reference driver
pub const DEFAULT_STEP: f64 = 0.85;

/// Streaming EM estimator owning the mixture model it refines
#[derive(Debug, Clone)]
pub struct OnlineEm {
    step: f64,
    s1_1: f64,
    s1_2: PWM,
    s2_2: PWM,
    model: MixtureModel,
    observed: usize,
}

impl OnlineEm {
    /// Starts an estimator from an initial guess.
    ///
    /// # Errors
    /// * `MotifError::InvalidParameter` if `step` is outside (0, 1]
    pub fn new(initial: MixtureModel, step: f64) -> Result<Self> {
        if !(step > 0.0 && step <= 1.0) {
            return Err(MotifError::invalid_parameter(
                "step",
                step,
                "must lie in (0, 1]",
            ));
        }
        Ok(Self {
            step,
            s1_1: initial.lambda,
            s1_2: initial.motif.clone(),
            s2_2: initial.background.clone(),
            model: initial,
            observed: 0,
        })
    }

    /// Step size applied to every statistic update
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of sequences consumed so far
    pub fn sequences_seen(&self) -> usize {
        self.observed
    }

    /// Current model parameters
    pub fn model(&self) -> &MixtureModel {
        &self.model
    }

    pub fn into_model(self) -> MixtureModel {
        self.model
    }

    /// Encodes and consumes one sequence, returning the updated model.
    pub fn observe(&mut self, sequence: &str) -> Result<&MixtureModel> {
        let indicator = IndicatorMatrix::encode(sequence, self.model.width())?;
        self.observe_indicator(&indicator)
    }

    /// Consumes one already encoded sequence, returning the updated model.
    ///
    /// # Errors
    /// * `MotifError::InvalidInput` if the indicator width differs from the model width
    pub fn observe_indicator(&mut self, indicator: &IndicatorMatrix) -> Result<&MixtureModel> {
        let width = self.model.width();
        if indicator.width() != width {
            return Err(MotifError::InvalidInput(format!(
                "indicator width {} does not match model width {}",
                indicator.width(),
                width
            )));
        }

        // E-step against the current parameters
        let z = sequence_responsibility(indicator, &self.model)?;
        let ind = indicator.to_f64();
        let ds1_2 = &ind * z;
        let ds2_2 = &ind * (1.0 - z);

        let step = self.step();
        self.s1_1 += step * (z - self.s1_1);
        self.s1_2.zip_mut_with(&ds1_2, |s, &ds| *s += step * (ds - *s));
        self.s2_2.zip_mut_with(&ds2_2, |s, &ds| *s += step * (ds - *s));

        // M-step: the motif is taken from s1_2 as is, the background is collapsed
        // to a single distribution and replicated over every position
        let background = match collapse_counts(&self.s2_2) {
            Some(distribution) => background_matrix(distribution.view(), width),
            None => self.model.background.clone(),
        };
        self.model = MixtureModel::from_parts(self.s1_1, self.s1_2.clone(), background);
        self.observed += 1;

        debug!(
            sequence = self.observed,
            responsibility = z,
            lambda = self.model.lambda,
            "online EM update"
        );
        Ok(&self.model)
    }

    /// Consumes every sequence of `sequences` in order and returns the final model.
    ///
    /// Stops at the first malformed sequence; an empty input returns the
    /// current model unchanged.
    pub fn fit<I, S>(mut self, sequences: I) -> Result<MixtureModel>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let start = self.observed;
        for (idx, sequence) in sequences.into_iter().enumerate() {
            self.observe(sequence.as_ref()).map_err(|e| {
                MotifError::invalid_sequence(idx, format!("sequence {} rejected: {}", idx, e))
            })?;
        }
        info!(
            sequences = self.observed - start,
            lambda = self.model.lambda,
            "online EM pass finished"
        );
        Ok(self.into_model())
    }
}
