//! Block builders and a fully wired in-memory chain for tests.

use crate::adapters::{InMemoryBlockStore, InMemoryPendingBlocks, StaticHeadProvider};
use crate::domain::ChainQueryConfig;
use crate::error::VerificationError;
use crate::ports::outbound::{BlockSignatureVerifier, HeadState};
use crate::service::{ChainQueryDependencies, ChainQueryService};
use parking_lot::RwLock;
use shared_bus::InMemoryEventBus;
use shared_types::{BeaconBlock, ForkVersion, SignedBeaconBlock, Slot};
use std::collections::HashSet;
use std::sync::Arc;

/// Phase0 block at `slot`. Blocks that differ only in `variant` are
/// siblings: same slot, different roots.
pub fn make_block(slot: Slot, variant: u8) -> SignedBeaconBlock {
    SignedBeaconBlock::new(
        ForkVersion::Phase0,
        BeaconBlock {
            slot,
            proposer_index: slot % 64,
            parent_root: [slot as u8; 32],
            state_root: [0x22; 32],
            body: vec![variant],
        },
    )
    .with_signature([0xAA; 96])
}

/// Accepts every signature except those of blocks at rejected slots.
#[derive(Default)]
pub struct ScriptedVerifier {
    rejected: RwLock<HashSet<Slot>>,
}

impl ScriptedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reject_slot(&self, slot: Slot) {
        self.rejected.write().insert(slot);
    }
}

impl BlockSignatureVerifier for ScriptedVerifier {
    fn verify_block_signature(
        &self,
        _state: &HeadState,
        block: &SignedBeaconBlock,
    ) -> Result<(), VerificationError> {
        if self.rejected.read().contains(&block.slot()) {
            return Err(VerificationError::InvalidSignature { slot: block.slot() });
        }
        Ok(())
    }
}

/// Every collaborator of the service, in memory.
pub struct TestChain {
    pub store: Arc<InMemoryBlockStore>,
    pub pending: Arc<InMemoryPendingBlocks>,
    pub head: Arc<StaticHeadProvider>,
    pub verifier: Arc<ScriptedVerifier>,
    pub bus: Arc<InMemoryEventBus>,
}

impl TestChain {
    pub fn new() -> Self {
        let config = ChainQueryConfig::default();
        Self {
            store: Arc::new(InMemoryBlockStore::new(config.slots_per_epoch)),
            pending: Arc::new(InMemoryPendingBlocks::new()),
            head: Arc::new(StaticHeadProvider::new()),
            verifier: Arc::new(ScriptedVerifier::new()),
            bus: Arc::new(InMemoryEventBus::new()),
        }
    }

    pub fn deps(&self) -> ChainQueryDependencies {
        ChainQueryDependencies {
            store: self.store.clone(),
            canonical: self.store.clone(),
            pending: self.pending.clone(),
            head: self.head.clone(),
            finalization: self.store.clone(),
            verifier: self.verifier.clone(),
            feed: self.bus.clone(),
        }
    }

    /// Service over this chain with the default configuration.
    pub fn service(&self) -> ChainQueryService {
        match ChainQueryService::new(ChainQueryConfig::default(), self.deps()) {
            Ok(service) => service,
            Err(e) => panic!("default configuration rejected: {e}"),
        }
    }
}

impl Default for TestChain {
    fn default() -> Self {
        Self::new()
    }
}
