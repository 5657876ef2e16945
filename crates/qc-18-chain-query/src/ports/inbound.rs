//! Driving Ports (API - Inbound)

use crate::domain::{
    BlockPage, BlockRecord, ChainHeadSummary, ListBlocksRequest, WeakSubjectivityCheckpoint,
};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::ports::outbound::StreamSink;
use crate::stream::StreamContext;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::Slot;

/// Options for [`ChainQueryApi::stream_blocks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBlocksRequest {
    /// Forward only blocks that went through the state transition.
    /// Otherwise forward gossip blocks after a signature check.
    pub verified_only: bool,
}

/// Options for [`ChainQueryApi::stream_pending_blocks`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamPendingBlocksRequest {
    /// Replay starts at the epoch containing this slot
    pub from_slot: Slot,
    /// Live phase follows processed blocks instead of received ones
    pub verified_only: bool,
}

/// Primary Chain Query API
///
/// Request/response reads plus three long-lived streams. A stream runs
/// until it is canceled or its session fails, and returns the reason it
/// ended.
#[async_trait]
pub trait ChainQueryApi: Send + Sync {
    /// List one page of blocks matching the request's filter.
    async fn list_blocks(&self, request: ListBlocksRequest) -> ChainQueryResult<BlockPage>;

    /// Head block and its checkpoints, each validated against storage.
    async fn get_chain_head(&self) -> ChainQueryResult<ChainHeadSummary>;

    async fn get_weak_subjectivity_checkpoint(
        &self,
    ) -> ChainQueryResult<WeakSubjectivityCheckpoint>;

    /// Forward live blocks to `sink`.
    async fn stream_blocks(
        &self,
        request: StreamBlocksRequest,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: StreamContext,
    ) -> ChainQueryError;

    /// Send a fresh chain head after every processed block.
    async fn stream_chain_head(
        &self,
        sink: &dyn StreamSink<ChainHeadSummary>,
        ctx: StreamContext,
    ) -> ChainQueryError;

    /// Replay finalized history, drain the pending cache, then follow the
    /// live feed, without gaps or duplicates.
    async fn stream_pending_blocks(
        &self,
        request: StreamPendingBlocksRequest,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: StreamContext,
    ) -> ChainQueryError;
}
