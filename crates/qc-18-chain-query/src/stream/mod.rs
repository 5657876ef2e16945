//! Streaming endpoints.
//!
//! ## Block Stream Phases
//!
//! ```text
//! [BACKFILL] ──→ [CACHE DRAIN] ──→ [LIVE CATCHUP] ──→ [LIVE TAIL] ──→ [CLOSED]
//!  finalized       pending-block     first live event    every live
//!  epochs from     snapshot, gap     fills any storage   event past
//!  storage         filled from       gap before it       the cursor
//!                  storage
//! ```
//!
//! Phases only move forward. Every exit path (cancellation, forced close,
//! send failure) releases the live subscription.

mod chain_head;
mod context;
mod reconciler;

pub use chain_head::ChainHeadStreamer;
pub use context::{CancelHandle, CancelSignal, StreamContext};
pub use reconciler::{LiveSelector, LiveStreamReconciler, StreamPhase, StreamPlan};

use crate::error::{ChainQueryError, ChainQueryResult};
use crate::ports::outbound::StreamSink;
use shared_bus::{BlockchainEvent, Subscription};

pub(crate) fn server_canceled() -> ChainQueryError {
    ChainQueryError::Canceled("Server context canceled".to_string())
}

pub(crate) fn stream_canceled() -> ChainQueryError {
    ChainQueryError::Canceled("Stream context canceled".to_string())
}

/// Fail if either cancellation source already fired.
pub(crate) fn check_cancelled(ctx: &StreamContext) -> ChainQueryResult<()> {
    if ctx.server.is_cancelled() {
        return Err(server_canceled());
    }
    if ctx.stream.is_cancelled() {
        return Err(stream_canceled());
    }
    Ok(())
}

/// Wait for the next live event, or for the call to end.
pub(crate) async fn next_event(
    subscription: &mut Subscription,
    ctx: &mut StreamContext,
) -> ChainQueryResult<BlockchainEvent> {
    tokio::select! {
        biased;
        _ = ctx.server.cancelled() => Err(server_canceled()),
        _ = ctx.stream.cancelled() => Err(stream_canceled()),
        received = subscription.recv() => received.map_err(|_| {
            ChainQueryError::Aborted("Subscriber closed, exiting stream".to_string())
        }),
    }
}

/// Deliver one value unless the call ends first.
pub(crate) async fn send_or_cancel<T: Send>(
    sink: &dyn StreamSink<T>,
    item: T,
    ctx: &mut StreamContext,
) -> ChainQueryResult<()> {
    tokio::select! {
        biased;
        _ = ctx.server.cancelled() => Err(server_canceled()),
        _ = ctx.stream.cancelled() => Err(stream_canceled()),
        sent = sink.send(item) => sent.map_err(|e| {
            ChainQueryError::Unavailable(format!("Could not send over stream: {e}"))
        }),
    }
}
