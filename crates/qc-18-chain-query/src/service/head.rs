//! Chain head resolution with checkpoint validation.

use crate::domain::{slots, ChainHeadSummary, Checkpoint};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::ports::outbound::{BlockStore, FinalizationProvider, HeadProvider};
use std::sync::Arc;
use tracing::debug;

/// Checks that checkpoints resolve to stored blocks.
///
/// One validator lives for one resolution: the genesis lookup it performs
/// for the zero checkpoint is done at most once.
pub struct CheckpointValidator<'a> {
    store: &'a dyn BlockStore,
    genesis_valid: bool,
}

impl<'a> CheckpointValidator<'a> {
    pub fn new(store: &'a dyn BlockStore) -> Self {
        Self {
            store,
            genesis_valid: false,
        }
    }

    /// Validate `checkpoint`; `name` labels it in error messages.
    pub async fn validate(&mut self, checkpoint: &Checkpoint, name: &str) -> ChainQueryResult<()> {
        if checkpoint.is_genesis() {
            if self.genesis_valid {
                return Ok(());
            }
            let genesis = self
                .store
                .genesis_block()
                .await
                .map_err(|e| ChainQueryError::internal("Could not get genesis block", e))?;
            if genesis.is_none() {
                return Err(ChainQueryError::NotFound(
                    "Could not get genesis block".to_string(),
                ));
            }
            self.genesis_valid = true;
            return Ok(());
        }

        let block = self
            .store
            .block_by_root(&checkpoint.root)
            .await
            .map_err(|e| ChainQueryError::internal(&format!("Could not get {name} block"), e))?;
        if block.is_none() {
            return Err(ChainQueryError::NotFound(format!(
                "Could not get {name} block: no block at epoch {} with the checkpoint root",
                checkpoint.epoch
            )));
        }
        Ok(())
    }
}

/// Assembles [`ChainHeadSummary`] snapshots.
pub struct ChainHeadResolver {
    store: Arc<dyn BlockStore>,
    head: Arc<dyn HeadProvider>,
    finalization: Arc<dyn FinalizationProvider>,
    slots_per_epoch: u64,
}

impl ChainHeadResolver {
    pub fn new(
        store: Arc<dyn BlockStore>,
        head: Arc<dyn HeadProvider>,
        finalization: Arc<dyn FinalizationProvider>,
        slots_per_epoch: u64,
    ) -> Self {
        Self {
            store,
            head,
            finalization,
            slots_per_epoch,
        }
    }

    /// Resolve the current head. Any failure aborts the whole resolution.
    pub async fn resolve(&self) -> ChainQueryResult<ChainHeadSummary> {
        let head_block = self
            .head
            .head_block()
            .await
            .map_err(|e| ChainQueryError::internal("Could not get head block", e))?
            .ok_or_else(|| ChainQueryError::NotFound("Head block of chain was nil".to_string()))?;
        let head_root = head_block
            .block_root()
            .map_err(|e| ChainQueryError::internal("Could not get head block root", e))?;
        let optimistic_status = self
            .head
            .is_optimistic()
            .await
            .map_err(|e| ChainQueryError::internal("Could not get optimistic status", e))?;

        let finalized = self.finalization.finalized_checkpoint();
        let justified = self.finalization.current_justified_checkpoint();
        let previous_justified = self.finalization.previous_justified_checkpoint();

        let mut validator = CheckpointValidator::new(self.store.as_ref());
        validator.validate(&finalized, "finalized").await?;
        validator.validate(&justified, "justified").await?;
        validator
            .validate(&previous_justified, "prev justified")
            .await?;

        let head_slot = head_block.slot();
        let summary = ChainHeadSummary {
            head_slot,
            head_epoch: self.epoch_of(head_slot)?,
            head_root,
            finalized_slot: self.start_slot(&finalized, "finalized")?,
            finalized_epoch: finalized.epoch,
            finalized_root: finalized.root,
            justified_slot: self.start_slot(&justified, "justified")?,
            justified_epoch: justified.epoch,
            justified_root: justified.root,
            previous_justified_slot: self.start_slot(&previous_justified, "prev justified")?,
            previous_justified_epoch: previous_justified.epoch,
            previous_justified_root: previous_justified.root,
            optimistic_status,
        };

        debug!(
            head_slot = summary.head_slot,
            finalized_epoch = summary.finalized_epoch,
            justified_epoch = summary.justified_epoch,
            "[qc-18] Resolved chain head"
        );
        Ok(summary)
    }

    fn epoch_of(&self, slot: u64) -> ChainQueryResult<u64> {
        slots::to_epoch(slot, self.slots_per_epoch)
            .map_err(|e| ChainQueryError::internal("Could not compute head epoch", e))
    }

    fn start_slot(&self, checkpoint: &Checkpoint, name: &str) -> ChainQueryResult<u64> {
        slots::epoch_start(checkpoint.epoch, self.slots_per_epoch).map_err(|e| {
            ChainQueryError::internal(
                &format!("Could not get epoch start slot from {name} checkpoint epoch"),
                e,
            )
        })
    }
}
