use ndarray::{Array1, Array2};

/// Nucleotide alphabet, in column order of every matrix in this crate
pub const ALPHABET: [char; 4] = ['A', 'C', 'G', 'T'];

/// Number of letters in [`ALPHABET`]
pub const ALPHABET_SIZE: usize = ALPHABET.len();

/// Tolerance used when checking that a probability row sums to 1
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

/// Represents a Position Weight Matrix (PWM)
/// Stored as a W×4 matrix with columns A, C, G, T
pub type PWM = Array2<f64>;

/// A single categorical distribution over the alphabet
pub type LetterDistribution = Array1<f64>;
