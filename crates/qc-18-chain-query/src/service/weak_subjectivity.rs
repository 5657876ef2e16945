//! Weak subjectivity checkpoint reporting.

use crate::domain::{slots, weak_subjectivity, ChainQueryConfig, WeakSubjectivityCheckpoint};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::ports::outbound::{BlockStore, CanonicalChainOracle, HeadProvider};
use std::sync::Arc;
use tracing::info;

pub struct WeakSubjectivityResolver {
    store: Arc<dyn BlockStore>,
    canonical: Arc<dyn CanonicalChainOracle>,
    head: Arc<dyn HeadProvider>,
    config: ChainQueryConfig,
}

impl WeakSubjectivityResolver {
    pub fn new(
        store: Arc<dyn BlockStore>,
        canonical: Arc<dyn CanonicalChainOracle>,
        head: Arc<dyn HeadProvider>,
        config: ChainQueryConfig,
    ) -> Self {
        Self {
            store,
            canonical,
            head,
            config,
        }
    }

    /// Start of the current weak subjectivity period, with the canonical
    /// block and state roots to checkpoint-sync from.
    pub async fn resolve(&self) -> ChainQueryResult<WeakSubjectivityCheckpoint> {
        let state = self
            .head
            .head_state()
            .await
            .map_err(|e| ChainQueryError::internal("could not get head state", e))?;

        let ws_epoch = weak_subjectivity::compute_period(
            state.active_validator_count,
            state.total_active_balance,
            self.config.slots_per_epoch,
            &self.config.weak_subjectivity,
        )
        .and_then(|p| weak_subjectivity::latest_ws_epoch(state.finalized_checkpoint.epoch, p))
        .map_err(|e| ChainQueryError::internal("could not get weak subjectivity epoch", e))?;

        let ws_slot = slots::epoch_start(ws_epoch, self.config.slots_per_epoch)
            .map_err(|e| ChainQueryError::internal("could not get weak subjectivity slot", e))?;

        let block_root = self
            .canonical
            .block_root_for_slot(ws_slot)
            .await
            .map_err(|e| {
                ChainQueryError::internal(
                    &format!("could not find highest block below slot {ws_slot}"),
                    e,
                )
            })?;

        let block = self
            .store
            .block_by_root(&block_root)
            .await
            .map_err(|e| ChainQueryError::internal("could not read weak subjectivity block", e))?
            .ok_or_else(|| {
                ChainQueryError::Internal(format!(
                    "block from slot index {ws_slot} not found in db"
                ))
            })?;

        let checkpoint = WeakSubjectivityCheckpoint {
            epoch: ws_epoch,
            block_root,
            state_root: block.message.state_root,
        };
        info!(
            epoch = ws_epoch,
            block_root = ?block_root,
            state_root = ?checkpoint.state_root,
            "[qc-18] Weak subjectivity checkpoint reported"
        );
        Ok(checkpoint)
    }
}
