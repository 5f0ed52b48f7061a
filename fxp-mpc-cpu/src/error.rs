use fxp_mpc_common::MAX_THREADS;
use thiserror::Error;

/// An Error enum capturing the precondition violations raised by the engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid ring bit length {0}, expected a value in [1, 64]")]
    InvalidBitLength(usize),
    #[error("Invalid field modulus {modulus}: {reason}")]
    InvalidFieldModulus { modulus: u64, reason: &'static str },
    #[error("Invalid shift {shift} for a {bits}-bit domain")]
    InvalidShift { shift: u32, bits: u32 },
    #[error("Divisor must be positive")]
    InvalidDivisor,
    /// The protocols need six times the divisor to stay below the modulus.
    #[error("Divisor {divisor} is too large for the modulus")]
    DivisorTooLarge { divisor: u64 },
    #[error("Share at index {index} is not reduced")]
    UnreducedShare { index: usize },
    #[error("Length mismatch: input has {input} elements, output has {output}")]
    LengthMismatch { input: usize, output: usize },
    #[error("A {bits}-bit domain does not fit a {width}-bit share type")]
    UnsupportedShareWidth { bits: u32, width: usize },
    #[error("Invalid thread count {0}, expected a value in [1, {MAX_THREADS}]")]
    InvalidThreadCount(usize),
    #[error("Conversion error: {0}")]
    Conversion(String),
}
