//! Chain Query Service
//!
//! Wires the collaborators into the query engine, the head resolvers and
//! the stream reconciler, and implements [`ChainQueryApi`].

mod head;
mod query;
mod weak_subjectivity;

pub use head::{ChainHeadResolver, CheckpointValidator};
pub use query::BlockQueryEngine;
pub use weak_subjectivity::WeakSubjectivityResolver;

use crate::domain::{
    BlockPage, BlockRecord, ChainHeadSummary, ChainQueryConfig, ConfigError, ContainerProjection,
    ListBlocksRequest, Page, WeakSubjectivityCheckpoint,
};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::ports::inbound::{ChainQueryApi, StreamBlocksRequest, StreamPendingBlocksRequest};
use crate::ports::outbound::{
    BlockSignatureVerifier, BlockStore, CanonicalChainOracle, FinalizationProvider, HeadProvider,
    PendingBlockCache, StreamSink,
};
use crate::stream::{ChainHeadStreamer, LiveSelector, LiveStreamReconciler, StreamContext, StreamPlan};
use async_trait::async_trait;
use shared_bus::EventSubscriber;
use std::sync::Arc;
use tracing::info;

/// Collaborators the service reads from.
#[derive(Clone)]
pub struct ChainQueryDependencies {
    pub store: Arc<dyn BlockStore>,
    pub canonical: Arc<dyn CanonicalChainOracle>,
    pub pending: Arc<dyn PendingBlockCache>,
    pub head: Arc<dyn HeadProvider>,
    pub finalization: Arc<dyn FinalizationProvider>,
    pub verifier: Arc<dyn BlockSignatureVerifier>,
    pub feed: Arc<dyn EventSubscriber>,
}

/// The chain query subsystem.
///
/// Holds no mutable state across calls; every request and stream works
/// off fresh collaborator reads.
pub struct ChainQueryService {
    config: ChainQueryConfig,
    deps: ChainQueryDependencies,
    engine: BlockQueryEngine,
    head_resolver: ChainHeadResolver,
    ws_resolver: WeakSubjectivityResolver,
}

impl ChainQueryService {
    pub fn new(
        config: ChainQueryConfig,
        deps: ChainQueryDependencies,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let engine = BlockQueryEngine::new(deps.store.clone(), deps.canonical.clone(), &config);
        let head_resolver = ChainHeadResolver::new(
            deps.store.clone(),
            deps.head.clone(),
            deps.finalization.clone(),
            config.slots_per_epoch,
        );
        let ws_resolver = WeakSubjectivityResolver::new(
            deps.store.clone(),
            deps.canonical.clone(),
            deps.head.clone(),
            config.clone(),
        );

        info!(
            slots_per_epoch = config.slots_per_epoch,
            max_page_size = config.max_page_size,
            "[qc-18] Chain query service initialized"
        );

        Ok(Self {
            config,
            deps,
            engine,
            head_resolver,
            ws_resolver,
        })
    }

    pub fn config(&self) -> &ChainQueryConfig {
        &self.config
    }

    /// List blocks projected into a wire schema's containers.
    ///
    /// A block the schema cannot represent fails the whole page.
    pub async fn list_block_containers<P: ContainerProjection>(
        &self,
        request: ListBlocksRequest,
    ) -> ChainQueryResult<Page<P::Output>> {
        let page = self.engine.list(&request).await?;
        page.try_map(|record| {
            P::project(&record).map_err(|e| {
                ChainQueryError::internal("Could not get block container", e)
            })
        })
    }

    fn reconciler(&self) -> LiveStreamReconciler<'_> {
        LiveStreamReconciler::new(&self.engine, &self.deps, self.config.slots_per_epoch)
    }
}

#[async_trait]
impl ChainQueryApi for ChainQueryService {
    async fn list_blocks(&self, request: ListBlocksRequest) -> ChainQueryResult<BlockPage> {
        self.engine.list(&request).await
    }

    async fn get_chain_head(&self) -> ChainQueryResult<ChainHeadSummary> {
        self.head_resolver.resolve().await
    }

    async fn get_weak_subjectivity_checkpoint(
        &self,
    ) -> ChainQueryResult<WeakSubjectivityCheckpoint> {
        self.ws_resolver.resolve().await
    }

    async fn stream_blocks(
        &self,
        request: StreamBlocksRequest,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: StreamContext,
    ) -> ChainQueryError {
        let selector = if request.verified_only {
            LiveSelector::Verified
        } else {
            LiveSelector::Received
        };
        self.reconciler()
            .run(StreamPlan::live(selector), sink, ctx)
            .await
    }

    async fn stream_chain_head(
        &self,
        sink: &dyn StreamSink<ChainHeadSummary>,
        ctx: StreamContext,
    ) -> ChainQueryError {
        ChainHeadStreamer::new(&self.head_resolver, self.deps.feed.as_ref())
            .run(sink, ctx)
            .await
    }

    async fn stream_pending_blocks(
        &self,
        request: StreamPendingBlocksRequest,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: StreamContext,
    ) -> ChainQueryError {
        let selector = if request.verified_only {
            LiveSelector::Verified
        } else {
            LiveSelector::Received
        };
        self.reconciler()
            .run(StreamPlan::pending(request.from_slot, selector), sink, ctx)
            .await
    }
}
