//! Streaming motif discovery in DNA sequences with a two-component mixture model
//!
//! Sequences of a fixed width are encoded as indicator matrices and fed one
//! at a time to an online EM estimator that refines a motif PWM, a
//! position-independent background and the mixture weight between them. A
//! batch EM with a convergence check is available as the exact reference.

pub mod batch;
pub mod config;
pub mod driver;
pub mod encode;
pub mod error;
pub mod fasta;
pub mod model;
pub mod motif_io;
pub mod online;
pub mod posterior;
pub mod report;
pub mod types;

pub use config::{EmConfig, FitMode};
pub use encode::IndicatorMatrix;
pub use error::{MotifError, Result};
pub use model::MixtureModel;
pub use online::OnlineEm;
