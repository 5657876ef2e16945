//! Driven Ports (SPI - Outbound Dependencies)
//!
//! Everything here is read-only from the chain query side. Storage-backed
//! reads return [`StoreError`]; the service maps it into the error taxonomy.

use crate::domain::Checkpoint;
use crate::error::{SinkError, StoreError, VerificationError};
use async_trait::async_trait;
use shared_types::{Epoch, Hash, SignedBeaconBlock, Slot};
use tokio::sync::mpsc;

/// Persisted block store.
///
/// Every multi-block read returns blocks in ascending slot order.
#[async_trait]
pub trait BlockStore: Send + Sync {
    /// Blocks whose slot falls in `[start, end]`, epochs inclusive.
    async fn blocks_by_epoch_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<SignedBeaconBlock>, StoreError>;

    /// Blocks with slot in `[start, end]`, inclusive.
    async fn blocks_by_slot_range(
        &self,
        start: Slot,
        end: Slot,
    ) -> Result<Vec<SignedBeaconBlock>, StoreError>;

    /// All blocks stored at `slot` (forks may leave several).
    async fn blocks_by_slot(&self, slot: Slot) -> Result<Vec<SignedBeaconBlock>, StoreError>;

    async fn block_by_root(&self, root: &Hash) -> Result<Option<SignedBeaconBlock>, StoreError>;

    async fn genesis_block(&self) -> Result<Option<SignedBeaconBlock>, StoreError>;

    /// Finalized checkpoint as last persisted.
    async fn finalized_checkpoint(&self) -> Result<Checkpoint, StoreError>;
}

/// Canonical chain membership, decided by fork choice.
#[async_trait]
pub trait CanonicalChainOracle: Send + Sync {
    async fn is_canonical(&self, root: &Hash) -> Result<bool, StoreError>;

    /// Root of the highest canonical block at or below `slot`.
    async fn block_root_for_slot(&self, slot: Slot) -> Result<Hash, StoreError>;
}

/// Blocks waiting for their parent before import.
pub trait PendingBlockCache: Send + Sync {
    /// Current contents, ascending by slot, taken atomically.
    fn sorted_snapshot(&self) -> Vec<SignedBeaconBlock>;
}

/// View of the head state needed by this subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeadState {
    pub slot: Slot,
    pub finalized_checkpoint: Checkpoint,
    pub active_validator_count: u64,
    /// Sum of active effective balances, in Gwei
    pub total_active_balance: u64,
}

/// Head of the chain as chosen by fork choice.
#[async_trait]
pub trait HeadProvider: Send + Sync {
    /// `None` when no head has been set yet.
    async fn head_block(&self) -> Result<Option<SignedBeaconBlock>, StoreError>;

    async fn head_state(&self) -> Result<HeadState, StoreError>;

    async fn is_optimistic(&self) -> Result<bool, StoreError>;
}

/// Latest justification and finalization results.
///
/// Reads are cheap snapshots; callers never cache them.
pub trait FinalizationProvider: Send + Sync {
    fn finalized_checkpoint(&self) -> Checkpoint;

    fn current_justified_checkpoint(&self) -> Checkpoint;

    fn previous_justified_checkpoint(&self) -> Checkpoint;
}

/// Proposer signature check against a head state.
pub trait BlockSignatureVerifier: Send + Sync {
    fn verify_block_signature(
        &self,
        state: &HeadState,
        block: &SignedBeaconBlock,
    ) -> Result<(), VerificationError>;
}

/// Consumer end of a stream.
#[async_trait]
pub trait StreamSink<T: Send>: Send + Sync {
    /// Deliver one value. An error means the consumer is gone.
    async fn send(&self, item: T) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: Send + 'static> StreamSink<T> for mpsc::Sender<T> {
    async fn send(&self, item: T) -> Result<(), SinkError> {
        mpsc::Sender::send(self, item).await.map_err(|_| SinkError)
    }
}
