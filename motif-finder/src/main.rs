use clap::Parser;
use online_meme_rs::config::{EmConfig, FitMode};
use online_meme_rs::driver::run_meme_files;
use online_meme_rs::error::MotifError;
use online_meme_rs::report::write_meme;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Motif search failed: {0}")]
    Motif(#[from] MotifError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(
    name = "motif-finder",
    about = "Discovers a recurring motif in fixed-width DNA sequences with online EM",
    long_about = "Fits a two-component mixture model (motif versus background) to a FASTA file \
                  of sequences whose length equals the motif width. Sequences are consumed one at \
                  a time by an online EM estimator; a batch EM with a convergence check is \
                  available with --batch. The fitted mixture weight, motif PWM and background \
                  matrix are printed to stdout.",
    version,
    after_help = "Example usage:\n    \
                  motif-finder sites.fasta --initial-motif NRF1_Motif.npy --width 10\n    \
                  motif-finder sites.fasta --initial-motif start.meme -w 8 --batch --output-meme fitted.meme",
    color = clap::ColorChoice::Always
)]
#[derive(Debug)]
struct Args {
    /// Path to the input FASTA file
    /// Every sequence must be exactly WIDTH nucleotides long
    #[arg(value_name = "FASTA")]
    fasta_file: String,

    /// Initial motif guess, a .npy array or a MEME file
    #[arg(long, value_name = "MOTIF_FILE")]
    initial_motif: String,

    /// TOML file with run options; command line flags take precedence
    #[arg(long, value_name = "CONFIG")]
    config: Option<String>,

    /// Motif width [default: 10]
    #[arg(short, long)]
    width: Option<usize>,

    /// Number of motifs to search for [default: 1]
    #[arg(short = 'n', long = "nummotifs")]
    num_motifs: Option<usize>,

    /// Worker threads for the batch E-step
    #[arg(short, long)]
    processes: Option<usize>,

    /// Online EM step size in (0, 1] [default: 0.85]
    #[arg(long)]
    step: Option<f64>,

    /// Initial motif mixture weight [default: 0.5]
    #[arg(long)]
    lambda: Option<f64>,

    /// Run convergence-gated batch EM instead of a single online pass
    #[arg(long)]
    batch: bool,

    /// Batch EM convergence tolerance on the motif PWM distance
    #[arg(long)]
    tolerance: Option<f64>,

    /// Batch EM iteration cap
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Drop malformed sequences instead of failing
    #[arg(long)]
    skip_invalid: bool,

    /// Print the fit report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write the fitted motif to this MEME file
    #[arg(long, value_name = "MEME_FILE")]
    output_meme: Option<String>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    /// Builds the run configuration: defaults, then the config file, then flags
    fn to_config(&self) -> Result<EmConfig, FinderError> {
        let mut config = match &self.config {
            Some(path) => EmConfig::from_toml_file(path)?,
            None => EmConfig::default(),
        };

        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(num_motifs) = self.num_motifs {
            config.num_motifs = num_motifs;
        }
        if let Some(processes) = self.processes {
            config.processes = Some(processes);
        }
        if let Some(step) = self.step {
            config.step = step;
        }
        if let Some(lambda) = self.lambda {
            config.initial_lambda = lambda;
        }
        if self.skip_invalid {
            config.skip_invalid = true;
        }
        if self.batch && config.mode == FitMode::Online {
            config.mode = FitMode::batch();
        }
        match &mut config.mode {
            FitMode::Batch {
                tolerance,
                max_iterations,
            } => {
                if let Some(t) = self.tolerance {
                    *tolerance = t;
                }
                if let Some(m) = self.max_iterations {
                    *max_iterations = m;
                }
            }
            FitMode::Online => {
                if self.tolerance.is_some() || self.max_iterations.is_some() {
                    warn!("--tolerance and --max-iterations only apply to batch EM, ignoring");
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("online_meme_rs={level},motif_finder={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), FinderError> {
    let start_time = std::time::Instant::now();

    let args = Args::parse();
    init_logging(&args.log_level);

    let config = args.to_config()?;
    info!(?config, "configuration");

    let report = run_meme_files(&args.fasta_file, &args.initial_motif, &config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("sequences: {}", report.sequences);
        if let FitMode::Batch { .. } = report.mode {
            println!("iterations: {} (converged: {})", report.iterations, report.converged);
        }
        print!("{}", report.model);
    }

    if let Some(output) = &args.output_meme {
        // Create output directory if it doesn't exist
        if let Some(parent) = Path::new(output).parent() {
            fs::create_dir_all(parent)?;
        }
        write_meme(output, "online_meme_1", &report)?;
        info!(output = %output, "wrote fitted motif");
    }

    let elapsed = start_time.elapsed();
    info!(
        "Total execution time: {:.4} minutes",
        elapsed.as_secs_f64() / 60.0
    );

    Ok(())
}
