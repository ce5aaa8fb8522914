use crate::error::{MotifError, Result};
use polars::prelude::*;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::{info, warn};

/// Reads sequences from a FASTA format file and converts them into a Polars DataFrame.
///
/// # Arguments
/// * `filename` - Path to the FASTA file to read
///
/// # Returns
/// * `Result<DataFrame>` - A DataFrame with two columns:
///   - "label": The sequence identifiers (without '>' prefix)
///   - "sequence": The corresponding DNA sequences in uppercase
///
/// # Errors
/// * Returns `MotifError::InvalidFileFormat` if no sequences are found or
///   sequence data appears before the first header
/// * Returns `MotifError::DataError` if DataFrame creation fails
/// * Returns `MotifError::Io` for file reading issues
pub fn read_fasta(filename: &str) -> Result<DataFrame> {
    let mut records: Vec<(String, String)> = Vec::new();
    let file = File::open(filename)?;
    let reader = BufReader::new(file);

    let mut current_header: Option<String> = None;
    let mut current_sequence = String::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if let Some(header) = line.strip_prefix('>') {
            if let Some(previous) = current_header.take() {
                records.push((previous, current_sequence.to_uppercase()));
                current_sequence.clear();
            }
            current_header = Some(header.trim().to_string());
        } else if !line.is_empty() {
            if current_header.is_none() {
                return Err(MotifError::InvalidFileFormat(
                    "Sequence data before first '>' header".into(),
                ));
            }
            current_sequence.push_str(line);
        }
    }

    if let Some(header) = current_header {
        records.push((header, current_sequence.to_uppercase()));
    }

    if records.is_empty() {
        return Err(MotifError::InvalidFileFormat("No sequences found".into()));
    }

    let (labels, sequences): (Vec<String>, Vec<String>) = records.into_iter().unzip();
    let df = DataFrame::new(vec![
        Column::new("label".into(), labels),
        Column::new("sequence".into(), sequences),
    ])
    .map_err(|_| MotifError::DataError("Failed to create DataFrame".into()))?;

    info!(filename, sequences = df.height(), "read FASTA file");
    Ok(df)
}

/// Extracts the "sequence" column of a DataFrame in row order.
///
/// # Errors
/// * Returns `MotifError::DataError` if the column is missing, is not a string
///   column, or holds null values
pub fn sequences(df: &DataFrame) -> Result<Vec<String>> {
    let column = df
        .column("sequence")
        .map_err(|e| MotifError::DataError(e.to_string()))?
        .str()
        .map_err(|e| MotifError::DataError(e.to_string()))?;

    column
        .into_iter()
        .enumerate()
        .map(|(idx, seq)| {
            seq.map(str::to_string)
                .ok_or_else(|| MotifError::DataError(format!("Null sequence at row {}", idx)))
        })
        .collect()
}

/// Keeps only the sequences usable for a motif of the given width.
///
/// A row is kept when its sequence is exactly `width` letters long and made of
/// A, C, G and T only. Dropped rows are reported with a warning.
///
/// # Errors
/// * Returns `MotifError::DataError` if the lazy query fails
pub fn filter_valid(df: &DataFrame, width: usize) -> Result<DataFrame> {
    let filtered = df
        .clone()
        .lazy()
        .filter(
            col("sequence")
                .str()
                .len_chars()
                .eq(lit(width as u32))
                .and(col("sequence").str().contains(lit("[^ACGT]"), false).not()),
        )
        .collect()
        .map_err(|e| MotifError::DataError(e.to_string()))?;

    let dropped = df.height() - filtered.height();
    if dropped > 0 {
        warn!(dropped, width, "skipping malformed sequences");
    }
    Ok(filtered)
}
