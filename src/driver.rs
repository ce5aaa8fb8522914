use crate::batch::BatchEm;
use crate::config::{EmConfig, FitMode};
use crate::encode::encode_all;
use crate::error::{MotifError, Result};
use crate::fasta;
use crate::model::{uniform_background, MixtureModel};
use crate::motif_io::load_initial_motif;
use crate::online::OnlineEm;
use crate::report::FitReport;
use crate::types::PWM;
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};

/// Fits one motif to `sequences` starting from `initial_motif` and a uniform background.
///
/// Online mode makes a single pass over the sequences in order. Batch mode
/// loads the whole collection and iterates EM until convergence.
///
/// # Errors
/// * any configuration or initial motif validation error
/// * `MotifError::InvalidSequence` for the first malformed sequence
pub fn run_meme<I, S>(sequences: I, initial_motif: PWM, config: &EmConfig) -> Result<FitReport>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    config.validate()?;
    if initial_motif.nrows() != config.width {
        return Err(MotifError::invalid_pwm(format!(
            "initial motif has {} rows but the motif width is {}",
            initial_motif.nrows(),
            config.width
        )));
    }
    if config.num_motifs > 1 {
        warn!(
            num_motifs = config.num_motifs,
            "only one motif is fitted per run"
        );
    }

    let initial = MixtureModel::new(
        config.initial_lambda,
        initial_motif,
        uniform_background(config.width),
    )?;

    match config.mode {
        FitMode::Online => {
            if config.processes.is_some() {
                warn!("online EM is sequential, ignoring the processes option");
            }
            let estimator = OnlineEm::new(initial, config.step)?;
            let mut count = 0usize;
            let model = estimator.fit(sequences.into_iter().inspect(|_| count += 1))?;
            Ok(FitReport {
                model,
                sequences: count,
                iterations: 1,
                converged: false,
                mode: config.mode,
            })
        }
        FitMode::Batch {
            tolerance,
            max_iterations,
        } => {
            let indicators = encode_all(sequences, config.width)?;
            let em = BatchEm::new(tolerance, max_iterations)?;
            let fit = match config.processes {
                Some(threads) => ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| MotifError::invalid_parameter("processes", threads, e.to_string()))?
                    .install(|| em.fit(&indicators, initial))?,
                None => em.fit(&indicators, initial)?,
            };
            Ok(FitReport {
                model: fit.model,
                sequences: indicators.len(),
                iterations: fit.iterations,
                converged: fit.converged,
                mode: config.mode,
            })
        }
    }
}

/// Reads the sequences and the initial motif from disk, then runs [`run_meme`].
///
/// With `skip_invalid` set, sequences of the wrong length or with letters
/// outside ACGT are dropped before fitting instead of failing the run.
pub fn run_meme_files(fasta_path: &str, motif_path: &str, config: &EmConfig) -> Result<FitReport> {
    config.validate()?;
    let initial_motif = load_initial_motif(motif_path, config.width)?;

    let mut df = fasta::read_fasta(fasta_path)?;
    if config.skip_invalid {
        df = fasta::filter_valid(&df, config.width)?;
    }
    let sequences = fasta::sequences(&df)?;
    info!(fasta = fasta_path, motif = motif_path, sequences = sequences.len(), "starting motif search");

    run_meme(sequences, initial_motif, config)
}
