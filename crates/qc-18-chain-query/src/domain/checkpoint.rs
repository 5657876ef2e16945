//! Checkpoints and chain head summaries.

use serde::{Deserialize, Serialize};
use shared_types::{Epoch, Hash, Slot, ZERO_HASH};

/// A (root, epoch) pair naming a justified or finalized block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Checkpoint {
    pub epoch: Epoch,
    pub root: Hash,
}

impl Checkpoint {
    pub fn new(epoch: Epoch, root: Hash) -> Self {
        Self { epoch, root }
    }

    /// The genesis sentinel: zero root at epoch 0.
    ///
    /// A chain that has not justified anything yet reports this checkpoint;
    /// it is resolved through the genesis block, not by root.
    pub fn is_genesis(&self) -> bool {
        self.epoch == 0 && self.root == ZERO_HASH
    }
}

/// Snapshot of the chain head and its checkpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainHeadSummary {
    pub head_slot: Slot,
    pub head_epoch: Epoch,
    pub head_root: Hash,

    pub finalized_slot: Slot,
    pub finalized_epoch: Epoch,
    pub finalized_root: Hash,

    pub justified_slot: Slot,
    pub justified_epoch: Epoch,
    pub justified_root: Hash,

    pub previous_justified_slot: Slot,
    pub previous_justified_epoch: Epoch,
    pub previous_justified_root: Hash,

    /// Head was imported optimistically (execution payload not yet verified)
    pub optimistic_status: bool,
}

/// Checkpoint a new node can sync from without replaying history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeakSubjectivityCheckpoint {
    pub epoch: Epoch,
    pub block_root: Hash,
    pub state_root: Hash,
}
