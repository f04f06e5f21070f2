//! Error types for the cipher, the cube attack and the GF(2) solver.

use thiserror::Error;

use crate::{IV_BITS, KEY_BITS, cube::MAX_CUBE_SIZE};

/// Errors produced by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Key is not exactly 80 bits.
    #[error("invalid key length: expected {expected} bits, got {0}", expected = KEY_BITS)]
    InvalidKeyLength(usize),
    /// IV is not exactly 80 bits.
    #[error("invalid IV length: expected {expected} bits, got {0}", expected = IV_BITS)]
    InvalidIvLength(usize),
    /// Key bit index outside 0..80.
    #[error("key index {0} is outside 0..{end}", end = KEY_BITS)]
    KeyIndexOutOfRange(usize),
    /// Malformed cube.
    #[error(transparent)]
    Cube(#[from] CubeError),
    /// Row or right-hand side does not match the system dimensions.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    /// Attack configuration out of range.
    #[error("invalid attack configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Reasons a set of IV positions cannot form a cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CubeError {
    #[error("cube must contain at least one IV position")]
    Empty,
    #[error("cube has {0} positions, at most {max} are supported", max = MAX_CUBE_SIZE)]
    TooLarge(usize),
    #[error("IV position {0} is outside 0..{end}", end = IV_BITS)]
    IndexOutOfRange(usize),
    #[error("IV position {0} appears more than once")]
    Duplicate(usize),
}

/// Result type for fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;
