use crate::error::{MotifError, Result};
use crate::types::{ALPHABET, ALPHABET_SIZE};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use phf::phf_map;

/// Column of each recognized nucleotide in an indicator matrix
static LETTER_COLUMNS: phf::Map<char, usize> = phf_map! {
    'A' => 0,
    'C' => 1,
    'G' => 2,
    'T' => 3,
};

/// One-hot encoding of a fixed-width nucleotide sequence.
///
/// Row `i` has exactly one `true` entry, in the column of the letter found
/// at position `i`. Instances are only built by [`IndicatorMatrix::encode`],
/// so the one-true-per-row invariant always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorMatrix {
    matrix: Array2<bool>,
    columns: Vec<usize>,
}

impl IndicatorMatrix {
    /// Encodes `sequence` into its W×4 indicator matrix.
    ///
    /// Lowercase letters are accepted and treated as their uppercase form.
    ///
    /// # Errors
    /// * `MotifError::InvalidInput` if the sequence length differs from `width`
    /// * `MotifError::InvalidSequence` at the first symbol outside A, C, G, T
    pub fn encode(sequence: &str, width: usize) -> Result<Self> {
        let len = sequence.chars().count();
        if len != width {
            return Err(MotifError::InvalidInput(format!(
                "sequence length {} does not match motif width {}",
                len, width
            )));
        }

        let columns = sequence
            .chars()
            .enumerate()
            .map(|(position, c)| {
                LETTER_COLUMNS
                    .get(&c.to_ascii_uppercase())
                    .copied()
                    .ok_or_else(|| {
                        MotifError::invalid_sequence(
                            position,
                            format!("unrecognized nucleotide '{}'", c),
                        )
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut matrix = Array2::from_elem((width, ALPHABET_SIZE), false);
        for (row, &col) in columns.iter().enumerate() {
            matrix[[row, col]] = true;
        }

        Ok(Self { matrix, columns })
    }

    /// Number of positions (rows)
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column index of the observed letter at every position
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Read-only view of the W×4 boolean matrix
    pub fn view(&self) -> ArrayView2<'_, bool> {
        self.matrix.view()
    }

    /// The indicator matrix as 0/1 floats, ready to be weighted by a responsibility
    pub fn to_f64(&self) -> Array2<f64> {
        self.matrix.mapv(|b| if b { 1.0 } else { 0.0 })
    }

    /// Letter counts over the whole sequence (column sums)
    pub fn letter_counts(&self) -> Array1<f64> {
        self.to_f64().sum_axis(Axis(0))
    }

    /// Decodes the matrix back into its nucleotide string
    pub fn to_sequence(&self) -> String {
        self.columns.iter().map(|&c| ALPHABET[c]).collect()
    }
}

/// Converts a sequence string into its indicator matrix.
///
/// Shorthand for [`IndicatorMatrix::encode`].
pub fn sequence_to_indicator(sequence: &str, width: usize) -> Result<IndicatorMatrix> {
    IndicatorMatrix::encode(sequence, width)
}

/// Encodes every sequence of a collection, reporting the index of the first
/// malformed one.
pub fn encode_all<I, S>(sequences: I, width: usize) -> Result<Vec<IndicatorMatrix>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    sequences
        .into_iter()
        .enumerate()
        .map(|(idx, seq)| {
            IndicatorMatrix::encode(seq.as_ref(), width).map_err(|e| {
                MotifError::invalid_sequence(idx, format!("sequence {} rejected: {}", idx, e))
            })
        })
        .collect()
}
