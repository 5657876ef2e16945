//! # Error Types
//!
//! Defines error types used across crates.

use thiserror::Error;

/// Errors raised while encoding a block for hashing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// The block message could not be serialized into its canonical form.
    #[error("Could not encode block message: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for EncodingError {
    fn from(err: bincode::Error) -> Self {
        EncodingError::Serialization(err.to_string())
    }
}
