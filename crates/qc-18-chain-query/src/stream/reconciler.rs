//! Live stream reconciliation.
//!
//! Stitches three block sources into one ordered stream for one consumer:
//! the block store, the pending-block cache and the live feed. A
//! [`StreamCursor`] carried across the phases keeps delivery gapless and
//! duplicate-free at every handoff.

use super::{check_cancelled, next_event, send_or_cancel, StreamContext};
use crate::domain::{slots, BlockRecord, StreamCursor};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::metrics;
use crate::ports::outbound::StreamSink;
use crate::service::{BlockQueryEngine, ChainQueryDependencies};
use shared_bus::{BlockchainEvent, EventFilter, EventKind, Subscription};
use shared_types::{SignedBeaconBlock, Slot};
use tracing::{debug, error, warn};

/// Which live events carry blocks for the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSelector {
    /// Blocks as they arrive from gossip or sync
    Received,
    /// Blocks after the state transition
    Verified,
}

impl LiveSelector {
    fn kind(self) -> EventKind {
        match self {
            Self::Received => EventKind::ReceivedBlock,
            Self::Verified => EventKind::VerifiedBlock,
        }
    }
}

/// What a single stream call replays and follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamPlan {
    pub from_slot: Slot,
    pub selector: LiveSelector,
    /// Run backfill and cache drain before going live; genesis is never
    /// sent from storage in this mode
    pub replay_history: bool,
    /// Re-check proposer signatures of received blocks against the head state
    pub verify_signatures: bool,
}

impl StreamPlan {
    /// Live blocks only.
    pub fn live(selector: LiveSelector) -> Self {
        Self {
            from_slot: 0,
            selector,
            replay_history: false,
            verify_signatures: selector == LiveSelector::Received,
        }
    }

    /// Finalized history from `from_slot`'s epoch, then pending, then live.
    pub fn pending(from_slot: Slot, selector: LiveSelector) -> Self {
        Self {
            from_slot,
            selector,
            replay_history: true,
            verify_signatures: false,
        }
    }

    fn live_filter(&self) -> EventFilter {
        let mut kinds = vec![self.selector.kind()];
        if self.replay_history {
            // Blocks entering the cache after the drain snapshot
            kinds.push(EventKind::UnconfirmedBlock);
        }
        EventFilter {
            topics: Vec::new(),
            kinds,
        }
    }
}

/// Reconciler states. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreamPhase {
    Backfill,
    CacheDrain,
    LiveCatchup,
    LiveTail,
    Closed,
}

impl StreamPhase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Backfill => "backfill",
            Self::CacheDrain => "cache_drain",
            Self::LiveCatchup => "live_catchup",
            Self::LiveTail => "live_tail",
            Self::Closed => "closed",
        }
    }
}

/// Per-call state, owned by the task running the stream.
struct StreamRun {
    cursor: StreamCursor,
    phase: StreamPhase,
    suppress_genesis: bool,
}

impl StreamRun {
    fn enter(&mut self, phase: StreamPhase) {
        if phase > self.phase {
            debug!(
                from = self.phase.label(),
                to = phase.label(),
                last_sent_slot = ?self.cursor.last_sent_slot(),
                "[qc-18] Stream phase transition"
            );
            self.phase = phase;
        }
    }
}

pub struct LiveStreamReconciler<'a> {
    engine: &'a BlockQueryEngine,
    deps: &'a ChainQueryDependencies,
    slots_per_epoch: u64,
}

impl<'a> LiveStreamReconciler<'a> {
    pub fn new(
        engine: &'a BlockQueryEngine,
        deps: &'a ChainQueryDependencies,
        slots_per_epoch: u64,
    ) -> Self {
        Self {
            engine,
            deps,
            slots_per_epoch,
        }
    }

    /// Run one stream until it ends; returns why it ended.
    pub async fn run(
        &self,
        plan: StreamPlan,
        sink: &dyn StreamSink<BlockRecord>,
        mut ctx: StreamContext,
    ) -> ChainQueryError {
        metrics::record_stream_opened();

        let reason = match self.initial_run(&plan) {
            Ok(mut run) => {
                let reason = self.drive(&plan, sink, &mut ctx, &mut run).await;
                run.enter(StreamPhase::Closed);
                reason
            }
            Err(e) => e,
        };

        metrics::record_stream_closed();
        debug!(reason = %reason, "[qc-18] Block stream closed");
        reason
    }

    fn initial_run(&self, plan: &StreamPlan) -> ChainQueryResult<StreamRun> {
        let (cursor, phase) = if plan.replay_history {
            let epoch = slots::to_epoch(plan.from_slot, self.slots_per_epoch)
                .map_err(|e| ChainQueryError::internal("Could not compute start epoch", e))?;
            let start = slots::epoch_start(epoch, self.slots_per_epoch)
                .map_err(|e| ChainQueryError::internal("Could not compute start slot", e))?;
            let cursor = match start.checked_sub(1) {
                Some(before) => StreamCursor::after(before),
                None => StreamCursor::new(),
            };
            (cursor, StreamPhase::Backfill)
        } else {
            (StreamCursor::new(), StreamPhase::LiveCatchup)
        };

        Ok(StreamRun {
            cursor,
            phase,
            suppress_genesis: plan.replay_history,
        })
    }

    async fn drive(
        &self,
        plan: &StreamPlan,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryError {
        if plan.replay_history {
            if let Err(e) = self.backfill(plan, sink, ctx, run).await {
                return e;
            }
            run.enter(StreamPhase::CacheDrain);
            if let Err(e) = self.drain_cache(sink, ctx, run).await {
                return e;
            }
        }
        if let Err(e) = check_cancelled(ctx) {
            return e;
        }

        // Subscribed only now: anything published before this point is
        // covered by storage or the cache snapshot, or by the catch-up fill.
        run.enter(StreamPhase::LiveCatchup);
        let mut subscription = self.deps.feed.subscribe(plan.live_filter());
        let reason = self.follow(plan, &mut subscription, sink, ctx, run).await;
        subscription.unsubscribe();
        reason
    }

    async fn backfill(
        &self,
        plan: &StreamPlan,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryResult<()> {
        let start_epoch = slots::to_epoch(plan.from_slot, self.slots_per_epoch)
            .map_err(|e| ChainQueryError::internal("Could not compute start epoch", e))?;
        let finalized = self
            .deps
            .store
            .finalized_checkpoint()
            .await
            .map_err(|e| ChainQueryError::internal("Could not get finalized checkpoint", e))?;

        if start_epoch > finalized.epoch {
            debug!(
                start_epoch,
                finalized_epoch = finalized.epoch,
                "[qc-18] Nothing finalized past start epoch, skipping backfill"
            );
            return Ok(());
        }

        for epoch in start_epoch..=finalized.epoch {
            check_cancelled(ctx)?;
            let records = self.engine.blocks_in_epochs(epoch, epoch).await?;
            self.emit_stored(records, sink, ctx, run).await?;
        }

        let end = slots::epoch_end(finalized.epoch, self.slots_per_epoch)
            .map_err(|e| ChainQueryError::internal("Could not compute finalized end slot", e))?;
        run.cursor.skip_to(end);
        Ok(())
    }

    async fn drain_cache(
        &self,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryResult<()> {
        let snapshot = self.deps.pending.sorted_snapshot();
        debug!(cached = snapshot.len(), "[qc-18] Draining pending block cache");

        if let Some(first) = snapshot.first() {
            self.fill_gap(first.slot(), sink, ctx, run).await?;
        }

        for block in snapshot {
            if let Some(record) = record_for(block, "pending") {
                self.emit(record, sink, ctx, run).await?;
            }
        }
        Ok(())
    }

    async fn follow(
        &self,
        plan: &StreamPlan,
        subscription: &mut Subscription,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryError {
        loop {
            let event = match next_event(subscription, ctx).await {
                Ok(event) => event,
                Err(e) => return e,
            };
            let Some(record) = self.admit_event(plan, event).await else {
                continue;
            };

            // Catch-up ends at the first event past the cursor; replays of
            // already drained blocks leave the gap check pending
            let past_cursor = run
                .cursor
                .last_sent_slot()
                .map_or(true, |last| record.slot > last);
            if run.phase == StreamPhase::LiveCatchup && past_cursor {
                if let Err(e) = self.fill_gap(record.slot, sink, ctx, run).await {
                    return e;
                }
                run.enter(StreamPhase::LiveTail);
            }

            if let Err(e) = self.emit(record, sink, ctx, run).await {
                return e;
            }
        }
    }

    /// Turn a live event into a candidate record, or skip it.
    async fn admit_event(&self, plan: &StreamPlan, event: BlockchainEvent) -> Option<BlockRecord> {
        let received = matches!(event, BlockchainEvent::ReceivedBlock(_));
        let block = match (plan.selector, event) {
            (_, BlockchainEvent::UnconfirmedBlock(data)) => data.signed_block,
            (LiveSelector::Received, BlockchainEvent::ReceivedBlock(data)) => data.signed_block,
            (LiveSelector::Verified, BlockchainEvent::BlockProcessed(data)) => data.signed_block,
            (_, other) => {
                debug!(kind = ?other.kind(), "[qc-18] Ignoring event of unrequested kind");
                metrics::record_event_skipped("unrequested_kind");
                return None;
            }
        };
        let Some(block) = block else {
            warn!("[qc-18] Live event carried no block, skipping");
            metrics::record_event_skipped("missing_block");
            return None;
        };

        if plan.verify_signatures && received {
            let state = match self.deps.head.head_state().await {
                Ok(state) => state,
                Err(e) => {
                    error!(error = %e, block_slot = block.slot(), "[qc-18] Could not get head state");
                    metrics::record_event_skipped("head_state");
                    return None;
                }
            };
            if let Err(e) = self.deps.verifier.verify_block_signature(&state, &block) {
                warn!(error = %e, block_slot = block.slot(), "[qc-18] Could not verify block signature");
                metrics::record_event_skipped("signature");
                return None;
            }
        }

        record_for(block, "live")
    }

    /// Send stored blocks in `[cursor.next_slot(), before)` ahead of a
    /// block at slot `before`.
    async fn fill_gap(
        &self,
        before: Slot,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryResult<()> {
        // Nothing delivered and no replay boundary: nothing to be contiguous with
        if run.cursor.last_sent_slot().is_none() {
            return Ok(());
        }
        let next = run.cursor.next_slot();
        if before <= next {
            return Ok(());
        }

        debug!(from = next, to = before - 1, "[qc-18] Filling stream gap from storage");
        let records = self.engine.blocks_in_slots(next, before - 1).await?;
        self.emit_stored(records, sink, ctx, run).await
    }

    async fn emit_stored(
        &self,
        records: Vec<BlockRecord>,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryResult<()> {
        for record in records {
            if run.suppress_genesis && record.slot == 0 {
                continue;
            }
            self.emit(record, sink, ctx, run).await?;
        }
        Ok(())
    }

    async fn emit(
        &self,
        record: BlockRecord,
        sink: &dyn StreamSink<BlockRecord>,
        ctx: &mut StreamContext,
        run: &mut StreamRun,
    ) -> ChainQueryResult<()> {
        if !run.cursor.admits(record.slot, &record.root) {
            debug!(slot = record.slot, "[qc-18] Block already delivered, skipping");
            metrics::record_event_skipped("duplicate");
            return Ok(());
        }

        let (slot, root) = (record.slot, record.root);
        send_or_cancel(sink, record, ctx).await?;
        run.cursor.advance(slot, root);
        metrics::record_block_streamed(run.phase.label());
        Ok(())
    }
}

fn record_for(block: SignedBeaconBlock, source: &'static str) -> Option<BlockRecord> {
    let slot = block.slot();
    match BlockRecord::from_signed(block) {
        Ok(record) => Some(record),
        Err(e) => {
            warn!(error = %e, slot, source, "[qc-18] Could not compute block root, skipping");
            metrics::record_event_skipped("root");
            None
        }
    }
}
