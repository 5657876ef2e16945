//! # Core Domain Entities
//!
//! Defines the beacon block containers exchanged between the block feed,
//! the pending-block cache, block storage and the chain query subsystem.
//!
//! ## Clusters
//!
//! - **Chain**: `BeaconBlock`, `SignedBeaconBlock`, `ForkVersion`
//! - **Time**: `Slot`, `Epoch`

use crate::errors::EncodingError;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};

// =============================================================================
// CLUSTER A: PRIMITIVES
// =============================================================================

/// A 32-byte hash (block roots, state roots).
pub type Hash = [u8; 32];

/// A 96-byte BLS signature.
pub type BlsSignature = [u8; 96];

/// A slot number. Slots are the chain's unit of time.
pub type Slot = u64;

/// An epoch number. An epoch is a fixed-size group of consecutive slots.
pub type Epoch = u64;

/// Index of a validator in the registry.
pub type ValidatorIndex = u64;

/// The all-zero hash. A checkpoint with this root at epoch 0 is the genesis
/// sentinel.
pub const ZERO_HASH: Hash = [0u8; 32];

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Fork the block was produced under.
///
/// Determines which wire container a block projects into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ForkVersion {
    #[default]
    Phase0,
    Altair,
    Bellatrix,
}

/// The unsigned block message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BeaconBlock {
    /// Slot the block was proposed for.
    pub slot: Slot,
    /// Validator that proposed the block.
    pub proposer_index: ValidatorIndex,
    /// Root of the parent block.
    pub parent_root: Hash,
    /// Post-state root after applying this block.
    pub state_root: Hash,
    /// Opaque block body.
    pub body: Vec<u8>,
}

impl BeaconBlock {
    /// Compute the block root.
    ///
    /// The root is the SHA-256 digest of the canonical bincode encoding of
    /// the message. Two structurally equal messages always share a root.
    pub fn hash_tree_root(&self) -> Result<Hash, EncodingError> {
        let encoded = bincode::serialize(self)?;
        Ok(Sha256::digest(&encoded).into())
    }
}

/// A block message together with its proposer signature.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBeaconBlock {
    /// Fork the block belongs to.
    pub fork: ForkVersion,
    /// Whether the execution payload was replaced by its header.
    pub blinded: bool,
    /// The block message.
    pub message: BeaconBlock,
    /// Proposer signature over the block root.
    #[serde_as(as = "Bytes")]
    pub signature: BlsSignature,
}

impl SignedBeaconBlock {
    /// Wrap a message for the given fork with an empty signature.
    pub fn new(fork: ForkVersion, message: BeaconBlock) -> Self {
        Self {
            fork,
            blinded: false,
            message,
            signature: [0u8; 96],
        }
    }

    /// Set the proposer signature.
    pub fn with_signature(mut self, signature: BlsSignature) -> Self {
        self.signature = signature;
        self
    }

    /// Mark the block as blinded.
    pub fn blinded(mut self) -> Self {
        self.blinded = true;
        self
    }

    /// Slot of the wrapped message.
    pub fn slot(&self) -> Slot {
        self.message.slot
    }

    /// Root of the wrapped message.
    pub fn block_root(&self) -> Result<Hash, EncodingError> {
        self.message.hash_tree_root()
    }
}
