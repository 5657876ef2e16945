//! In-memory collaborators.
//!
//! Roots are computed on read, so inserting never fails.

use crate::domain::{slots, Checkpoint};
use crate::error::StoreError;
use crate::ports::outbound::{
    BlockStore, CanonicalChainOracle, FinalizationProvider, HeadProvider, HeadState,
    PendingBlockCache,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Epoch, Hash, SignedBeaconBlock, Slot};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

fn root_of(block: &SignedBeaconBlock) -> Result<Hash, StoreError> {
    block
        .block_root()
        .map_err(|e| StoreError::Corrupted(e.to_string()))
}

#[derive(Default)]
struct StoreState {
    /// slot -> every block stored at that slot
    blocks: BTreeMap<Slot, Vec<SignedBeaconBlock>>,
    /// slot -> the canonical block at that slot
    canonical: BTreeMap<Slot, SignedBeaconBlock>,
    genesis: Option<SignedBeaconBlock>,
    finalized: Checkpoint,
    justified: Checkpoint,
    previous_justified: Checkpoint,
}

/// Block store, canonical oracle and finalization source in one.
///
/// Checkpoints start at the genesis sentinel. Lookup counters let tests
/// assert which reads a resolution performed.
pub struct InMemoryBlockStore {
    state: RwLock<StoreState>,
    slots_per_epoch: u64,
    failing: AtomicBool,
    root_lookups: AtomicUsize,
    genesis_lookups: AtomicUsize,
    epoch_range_reads: AtomicUsize,
}

impl InMemoryBlockStore {
    pub fn new(slots_per_epoch: u64) -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
            slots_per_epoch,
            failing: AtomicBool::new(false),
            root_lookups: AtomicUsize::new(0),
            genesis_lookups: AtomicUsize::new(0),
            epoch_range_reads: AtomicUsize::new(0),
        }
    }

    /// Store a block off the canonical chain.
    pub fn insert(&self, block: SignedBeaconBlock) {
        let mut state = self.state.write();
        let at_slot = state.blocks.entry(block.slot()).or_default();
        if !at_slot.contains(&block) {
            at_slot.push(block);
        }
    }

    /// Store a block and make it the canonical block of its slot.
    pub fn insert_canonical(&self, block: SignedBeaconBlock) {
        self.insert(block.clone());
        self.state.write().canonical.insert(block.slot(), block);
    }

    pub fn insert_genesis(&self, block: SignedBeaconBlock) {
        self.insert_canonical(block.clone());
        self.state.write().genesis = Some(block);
    }

    pub fn set_finalized(&self, checkpoint: Checkpoint) {
        self.state.write().finalized = checkpoint;
    }

    pub fn set_justified(&self, checkpoint: Checkpoint) {
        self.state.write().justified = checkpoint;
    }

    pub fn set_previous_justified(&self, checkpoint: Checkpoint) {
        self.state.write().previous_justified = checkpoint;
    }

    /// Make every read fail with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn root_lookups(&self) -> usize {
        self.root_lookups.load(Ordering::SeqCst)
    }

    pub fn genesis_lookups(&self) -> usize {
        self.genesis_lookups.load(Ordering::SeqCst)
    }

    pub fn epoch_range_reads(&self) -> usize {
        self.epoch_range_reads.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected failure".to_string()));
        }
        Ok(())
    }

    fn find_by_root(
        &self,
        root: &Hash,
        canonical_only: bool,
    ) -> Result<Option<SignedBeaconBlock>, StoreError> {
        let state = self.state.read();
        let candidates: Box<dyn Iterator<Item = &SignedBeaconBlock>> = if canonical_only {
            Box::new(state.canonical.values())
        } else {
            Box::new(state.blocks.values().flatten())
        };
        for block in candidates {
            if root_of(block)? == *root {
                return Ok(Some(block.clone()));
            }
        }
        Ok(None)
    }

    fn slot_range(&self, start: Slot, end: Slot) -> Vec<SignedBeaconBlock> {
        if start > end {
            return Vec::new();
        }
        self.state
            .read()
            .blocks
            .range(start..=end)
            .flat_map(|(_, blocks)| blocks.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl BlockStore for InMemoryBlockStore {
    async fn blocks_by_epoch_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<SignedBeaconBlock>, StoreError> {
        self.epoch_range_reads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        let first = slots::epoch_start(start, self.slots_per_epoch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let last = slots::epoch_end(end, self.slots_per_epoch)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(self.slot_range(first, last))
    }

    async fn blocks_by_slot_range(
        &self,
        start: Slot,
        end: Slot,
    ) -> Result<Vec<SignedBeaconBlock>, StoreError> {
        self.check_available()?;
        Ok(self.slot_range(start, end))
    }

    async fn blocks_by_slot(&self, slot: Slot) -> Result<Vec<SignedBeaconBlock>, StoreError> {
        self.check_available()?;
        Ok(self.slot_range(slot, slot))
    }

    async fn block_by_root(&self, root: &Hash) -> Result<Option<SignedBeaconBlock>, StoreError> {
        self.root_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        self.find_by_root(root, false)
    }

    async fn genesis_block(&self) -> Result<Option<SignedBeaconBlock>, StoreError> {
        self.genesis_lookups.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.state.read().genesis.clone())
    }

    async fn finalized_checkpoint(&self) -> Result<Checkpoint, StoreError> {
        self.check_available()?;
        Ok(self.state.read().finalized)
    }
}

#[async_trait]
impl CanonicalChainOracle for InMemoryBlockStore {
    async fn is_canonical(&self, root: &Hash) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.find_by_root(root, true)?.is_some())
    }

    async fn block_root_for_slot(&self, slot: Slot) -> Result<Hash, StoreError> {
        self.check_available()?;
        let highest = self
            .state
            .read()
            .canonical
            .range(..=slot)
            .next_back()
            .map(|(_, block)| block.clone());
        match highest {
            Some(block) => root_of(&block),
            None => Err(StoreError::Backend(format!(
                "no canonical block at or below slot {slot}"
            ))),
        }
    }
}

impl FinalizationProvider for InMemoryBlockStore {
    fn finalized_checkpoint(&self) -> Checkpoint {
        self.state.read().finalized
    }

    fn current_justified_checkpoint(&self) -> Checkpoint {
        self.state.read().justified
    }

    fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.state.read().previous_justified
    }
}

/// Pending-block cache.
#[derive(Default)]
pub struct InMemoryPendingBlocks {
    blocks: RwLock<Vec<SignedBeaconBlock>>,
}

impl InMemoryPendingBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, block: SignedBeaconBlock) {
        let mut blocks = self.blocks.write();
        let at = blocks.partition_point(|b| b.slot() <= block.slot());
        blocks.insert(at, block);
    }

    /// Drop every cached block at or below `slot`, as import does.
    pub fn prune_through(&self, slot: Slot) {
        self.blocks.write().retain(|b| b.slot() > slot);
    }

    pub fn len(&self) -> usize {
        self.blocks.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.read().is_empty()
    }
}

impl PendingBlockCache for InMemoryPendingBlocks {
    fn sorted_snapshot(&self) -> Vec<SignedBeaconBlock> {
        self.blocks.read().clone()
    }
}

/// Head provider with settable head block, head state and optimistic flag.
pub struct StaticHeadProvider {
    head: RwLock<Option<SignedBeaconBlock>>,
    state: RwLock<Option<HeadState>>,
    optimistic: AtomicBool,
}

impl StaticHeadProvider {
    /// No head block yet; the head state is the default one.
    pub fn new() -> Self {
        Self {
            head: RwLock::new(None),
            state: RwLock::new(Some(HeadState::default())),
            optimistic: AtomicBool::new(false),
        }
    }

    pub fn set_head(&self, block: Option<SignedBeaconBlock>) {
        *self.head.write() = block;
    }

    pub fn set_state(&self, state: HeadState) {
        *self.state.write() = Some(state);
    }

    /// Make `head_state` fail until the next `set_state`.
    pub fn clear_state(&self) {
        *self.state.write() = None;
    }

    pub fn set_optimistic(&self, optimistic: bool) {
        self.optimistic.store(optimistic, Ordering::SeqCst);
    }
}

impl Default for StaticHeadProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HeadProvider for StaticHeadProvider {
    async fn head_block(&self) -> Result<Option<SignedBeaconBlock>, StoreError> {
        Ok(self.head.read().clone())
    }

    async fn head_state(&self) -> Result<HeadState, StoreError> {
        self.state.read().clone().ok_or(StoreError::HeadUnavailable)
    }

    async fn is_optimistic(&self) -> Result<bool, StoreError> {
        Ok(self.optimistic.load(Ordering::SeqCst))
    }
}
