use crate::error::{MotifError, Result};
use crate::model::validate_pwm;
use crate::types::*;
use ndarray::Array2;
use ndarray_npy::read_npy;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::iter::Peekable;
use std::path::Path;
use tracing::{info, warn};

/// Advances the iterator until a MOTIF line is found
fn skip_until_motif<I>(lines: &mut Peekable<I>)
where
    I: Iterator<Item = std::result::Result<String, std::io::Error>>,
{
    while let Some(Ok(line)) = lines.peek() {
        if line.starts_with("MOTIF") {
            break;
        }
        lines.next();
    }
}

/// Parses a single PWM from the iterator
fn parse_pwm<I>(lines: &mut Peekable<I>) -> Result<Option<(String, PWM)>>
where
    I: Iterator<Item = std::result::Result<String, std::io::Error>>,
{
    // Get motif ID from MOTIF line
    let motif_line = match lines.next() {
        Some(Ok(line)) if line.starts_with("MOTIF") => line,
        Some(Err(e)) => return Err(MotifError::Io(e)),
        _ => return Ok(None),
    };

    let motif_id = motif_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| MotifError::InvalidFileFormat("Missing motif ID".into()))?
        .to_string();

    // Skip blank lines and the letter-probability header
    while let Some(Ok(line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("letter-probability") {
            lines.next();
        } else {
            break;
        }
    }

    // Read PWM rows until we hit a non-numeric line
    let mut pwm_rows: Vec<Vec<f64>> = Vec::new();
    while let Some(Ok(line)) = lines.peek() {
        let trimmed = line.trim();
        if !trimmed.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            break;
        }
        let values: Vec<f64> = trimmed
            .split_whitespace()
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| MotifError::InvalidFileFormat(format!("Invalid PWM value: {}", e)))?;
        if values.len() != ALPHABET_SIZE {
            return Err(MotifError::InvalidFileFormat(format!(
                "Motif {} row {} has {} columns, expected {}",
                motif_id,
                pwm_rows.len() + 1,
                values.len(),
                ALPHABET_SIZE
            )));
        }
        pwm_rows.push(values);
        lines.next();
    }

    if pwm_rows.is_empty() {
        return Err(MotifError::InvalidFileFormat("Empty PWM".into()));
    }

    let width = pwm_rows.len();
    let pwm = Array2::from_shape_vec((width, ALPHABET_SIZE), pwm_rows.concat())
        .map_err(|e| MotifError::DataError(e.to_string()))?;

    Ok(Some((motif_id, pwm)))
}

/// Reads Position Weight Matrices (PWMs) from a MEME format file
///
/// This function parses a MEME-formatted file containing one or more Position Weight Matrices,
/// each identified by a motif ID. The PWMs represent DNA binding motifs where each position
/// contains probabilities for the four nucleotides (A, C, G, T).
///
/// # Arguments
/// * `filename` - Path to the MEME format file to read
///
/// # Returns
/// * `Result<Vec<(String, PWM)>>` - Motif IDs paired with their W×4 matrices, in file order
///
/// # Errors
/// * `MotifError::Io` - If the file cannot be opened or read
/// * `MotifError::InvalidFileFormat` - If the file format is invalid or no PWMs are found
///
/// # Format
/// The input file should be in MEME format, where each PWM is preceded by a "MOTIF" line
/// containing the motif ID, optionally a "letter-probability matrix" line,
/// followed by the matrix values.
pub fn read_meme_motifs(filename: &str) -> Result<Vec<(String, PWM)>> {
    let file = File::open(filename)?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines().peekable();
    let mut pwms = Vec::new();

    // Skip header until first MOTIF
    skip_until_motif(&mut lines);

    // Parse all PWMs
    while let Some((id, pwm)) = parse_pwm(&mut lines)? {
        pwms.push((id, pwm));
        skip_until_motif(&mut lines);
    }

    if pwms.is_empty() {
        return Err(MotifError::InvalidFileFormat("No PWMs found".into()));
    }

    Ok(pwms)
}

/// Reads a W×4 motif stored as a 2-D float64 `.npy` array
pub fn read_npy_motif(filename: &str) -> Result<PWM> {
    let pwm: Array2<f64> = read_npy(filename)?;
    Ok(pwm)
}

/// Loads the initial motif guess of a run and checks it against `width`.
///
/// Files ending in `.npy` are read as NumPy arrays, anything else as MEME
/// text. When a MEME file holds several motifs the first one is used.
///
/// # Errors
/// * `MotifError::InvalidPwm` if the matrix is not `width`×4 or a row is not
///   a probability distribution
/// * any read or parse error of the underlying format
pub fn load_initial_motif(filename: &str, width: usize) -> Result<PWM> {
    let is_npy = Path::new(filename)
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("npy"))
        .unwrap_or(false);

    let pwm = if is_npy {
        read_npy_motif(filename)?
    } else {
        let mut motifs = read_meme_motifs(filename)?;
        if motifs.len() > 1 {
            warn!(
                filename,
                motifs = motifs.len(),
                "several motifs found, using the first one"
            );
        }
        let (id, pwm) = motifs.swap_remove(0);
        info!(motif = %id, "loaded initial motif");
        pwm
    };

    if pwm.nrows() != width {
        return Err(MotifError::invalid_pwm(format!(
            "initial motif has {} rows but the motif width is {}",
            pwm.nrows(),
            width
        )));
    }
    validate_pwm(&pwm, "initial motif")?;
    Ok(pwm)
}
