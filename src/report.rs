use crate::config::FitMode;
use crate::error::Result;
use crate::model::MixtureModel;
use crate::types::ALPHABET;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};

/// Outcome of a motif discovery run
#[derive(Debug, Clone, Serialize)]
pub struct FitReport {
    pub model: MixtureModel,
    /// Sequences used for the fit
    pub sequences: usize,
    /// Passes over the data: 1 for online mode, E/M iterations for batch mode
    pub iterations: usize,
    pub converged: bool,
    pub mode: FitMode,
}

/// Writes the fitted motif in MEME minimal format.
///
/// The motif rows are normalized to sum to 1 and the fitted background
/// frequencies go in the `Background letter frequencies` section, so logo
/// tools that read MEME files can render the result.
pub fn write_meme(filename: &str, motif_id: &str, report: &FitReport) -> Result<()> {
    let mut out = BufWriter::new(File::create(filename)?);
    let model = &report.model;
    let background = model.background_distribution();

    writeln!(out, "MEME version 4")?;
    writeln!(out)?;
    writeln!(out, "ALPHABET= ACGT")?;
    writeln!(out)?;
    writeln!(out, "strands: +")?;
    writeln!(out)?;
    writeln!(out, "Background letter frequencies")?;
    let freqs: Vec<String> = ALPHABET
        .iter()
        .zip(background.iter())
        .map(|(letter, p)| format!("{} {:.6}", letter, p))
        .collect();
    writeln!(out, "{}", freqs.join(" "))?;
    writeln!(out)?;
    writeln!(out, "MOTIF {}", motif_id)?;
    writeln!(out)?;
    writeln!(
        out,
        "letter-probability matrix: alength= {} w= {} nsites= {} E= 0",
        ALPHABET.len(),
        model.width(),
        report.sequences
    )?;
    for row in model.normalized_motif().outer_iter() {
        let cells: Vec<String> = row.iter().map(|p| format!("{:.6}", p)).collect();
        writeln!(out, " {}", cells.join("  "))?;
    }
    out.flush()?;
    Ok(())
}
