//! Chain head stream.

use super::{next_event, send_or_cancel, StreamContext};
use crate::domain::ChainHeadSummary;
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::metrics;
use crate::ports::outbound::StreamSink;
use crate::service::ChainHeadResolver;
use shared_bus::{BlockchainEvent, EventFilter, EventKind, EventSubscriber, Subscription};
use tracing::debug;

/// Sends a fresh [`ChainHeadSummary`] after every processed block.
pub struct ChainHeadStreamer<'a> {
    resolver: &'a ChainHeadResolver,
    feed: &'a dyn EventSubscriber,
}

impl<'a> ChainHeadStreamer<'a> {
    pub fn new(resolver: &'a ChainHeadResolver, feed: &'a dyn EventSubscriber) -> Self {
        Self { resolver, feed }
    }

    /// Run until the call ends; returns why it ended.
    pub async fn run(
        &self,
        sink: &dyn StreamSink<ChainHeadSummary>,
        mut ctx: StreamContext,
    ) -> ChainQueryError {
        metrics::record_stream_opened();
        let mut subscription = self.feed.subscribe(EventFilter::kind(EventKind::VerifiedBlock));

        let reason = match self.follow(&mut subscription, sink, &mut ctx).await {
            Ok(never) => match never {},
            Err(e) => e,
        };

        subscription.unsubscribe();
        metrics::record_stream_closed();
        debug!(reason = %reason, "[qc-18] Chain head stream closed");
        reason
    }

    async fn follow(
        &self,
        subscription: &mut Subscription,
        sink: &dyn StreamSink<ChainHeadSummary>,
        ctx: &mut StreamContext,
    ) -> ChainQueryResult<std::convert::Infallible> {
        loop {
            let event = next_event(subscription, ctx).await?;
            if !matches!(event, BlockchainEvent::BlockProcessed(_)) {
                continue;
            }

            let head = self.resolver.resolve().await.map_err(|e| {
                ChainQueryError::Internal(format!("Could not retrieve chain head: {}", e.message()))
            })?;
            send_or_cancel(sink, head, ctx).await?;
            metrics::record_block_streamed("chain_head");
        }
    }
}
