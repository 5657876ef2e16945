//! Error types for the Chain Query subsystem
//!
//! Every public operation fails with a [`ChainQueryError`]. Collaborator
//! failures carry their own error types and are mapped into the taxonomy
//! at the call site, with a message naming the failing sub-step.

use serde::{Deserialize, Serialize};
use shared_types::EncodingError;
use thiserror::Error;

/// Chain query errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainQueryError {
    /// Bad or missing filter, page size over the maximum
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Missing head, genesis or checkpoint block
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage, derivation or hashing failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// The stream consumer is gone
    #[error("Unavailable: {0}")]
    Unavailable(String),

    /// The live feed force-closed the subscriber
    #[error("Aborted: {0}")]
    Aborted(String),

    /// Server or stream cancellation fired
    #[error("Canceled: {0}")]
    Canceled(String),
}

impl ChainQueryError {
    /// Taxonomy code of this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Internal(_) => ErrorCode::Internal,
            Self::Unavailable(_) => ErrorCode::Unavailable,
            Self::Aborted(_) => ErrorCode::Aborted,
            Self::Canceled(_) => ErrorCode::Canceled,
        }
    }

    /// Message without the taxonomy prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::Internal(m)
            | Self::Unavailable(m)
            | Self::Aborted(m)
            | Self::Canceled(m) => m,
        }
    }

    pub(crate) fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Internal(format!("{context}: {err}"))
    }
}

/// Transport-neutral error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidArgument,
    NotFound,
    Internal,
    Unavailable,
    Aborted,
    Canceled,
}

impl ErrorCode {
    /// JSON-RPC style numeric code for the transport layer.
    pub fn rpc_code(self) -> i32 {
        match self {
            Self::InvalidArgument => -32602,
            Self::NotFound => -32001,
            Self::Internal => -32603,
            Self::Unavailable => -32002,
            Self::Aborted => -32003,
            Self::Canceled => -32004,
        }
    }
}

/// Result type for chain query operations
pub type ChainQueryResult<T> = Result<T, ChainQueryError>;

/// Failure reported by a storage-backed collaborator
/// (block store, canonical chain oracle, head provider).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Backend could not serve the read
    #[error("Storage backend failure: {0}")]
    Backend(String),

    /// Stored bytes could not be decoded
    #[error("Corrupted record: {0}")]
    Corrupted(String),

    /// Head state is not available yet
    #[error("Head state unavailable")]
    HeadUnavailable,
}

/// Block signature check failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Invalid proposer signature for block at slot {slot}")]
    InvalidSignature { slot: u64 },
}

/// The stream consumer stopped accepting values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Stream consumer disconnected")]
pub struct SinkError;

/// Epoch/slot arithmetic failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SlotError {
    #[error("Epoch {epoch} start slot overflows with {slots_per_epoch} slots per epoch")]
    Overflow { epoch: u64, slots_per_epoch: u64 },

    #[error("Slots per epoch must be non-zero")]
    ZeroSlotsPerEpoch,
}

impl From<EncodingError> for ChainQueryError {
    fn from(err: EncodingError) -> Self {
        Self::internal("Could not compute block root", err)
    }
}
