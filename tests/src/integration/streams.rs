//! # Streaming Flows
//!
//! Block, pending-block and chain head streams served by one service while
//! a simulated node publishes on the shared bus.
//!
//! ## Flow Under Test
//!
//! ```text
//! store ──backfill──┐
//! pending cache ────┼──→ LiveStreamReconciler ──→ consumer
//! shared-bus ──live─┘
//! ```

#[cfg(test)]
mod tests {
    use super::super::{init_test_logging, RecordingSink};
    use qc_18_chain_query::test_utils::{make_block, TestChain};
    use qc_18_chain_query::{
        BlockRecord, CancelSignal, ChainHeadSummary, ChainQueryApi, ChainQueryError,
        ChainQueryService, Checkpoint, ErrorCode, StreamBlocksRequest, StreamContext,
        StreamPendingBlocksRequest,
    };
    use shared_bus::{BlockProcessedData, BlockchainEvent, EventPublisher};
    use shared_types::Slot;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{mpsc, watch};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    // =========================================================================
    // FIXTURES
    // =========================================================================

    fn processed(slot: Slot) -> BlockchainEvent {
        BlockchainEvent::BlockProcessed(BlockProcessedData {
            slot,
            block_root: make_block(slot, 0).block_root().unwrap(),
            signed_block: Some(make_block(slot, 0)),
            verified: true,
        })
    }

    async fn wait_for_subscribers(chain: &TestChain, n: usize) {
        timeout(WAIT, async {
            while chain.bus.subscriber_count() != n {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscriber count never reached");
    }

    async fn next_record(rx: &mut mpsc::Receiver<BlockRecord>) -> BlockRecord {
        timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for block")
            .expect("stream ended early")
    }

    async fn collect_slots(rx: &mut mpsc::Receiver<BlockRecord>, n: usize) -> Vec<Slot> {
        let mut slots = Vec::with_capacity(n);
        for _ in 0..n {
            slots.push(next_record(rx).await.slot);
        }
        slots
    }

    fn spawn_pending_stream(
        service: &Arc<ChainQueryService>,
        request: StreamPendingBlocksRequest,
        ctx: StreamContext,
    ) -> (mpsc::Receiver<BlockRecord>, JoinHandle<ChainQueryError>) {
        let (tx, rx) = mpsc::channel(64);
        let service = service.clone();
        let task =
            tokio::spawn(async move { service.stream_pending_blocks(request, &tx, ctx).await });
        (rx, task)
    }

    fn spawn_block_stream(
        service: &Arc<ChainQueryService>,
        request: StreamBlocksRequest,
        ctx: StreamContext,
    ) -> (mpsc::Receiver<BlockRecord>, JoinHandle<ChainQueryError>) {
        let (tx, rx) = mpsc::channel(64);
        let service = service.clone();
        let task = tokio::spawn(async move { service.stream_blocks(request, &tx, ctx).await });
        (rx, task)
    }

    // =========================================================================
    // PENDING BLOCK STREAM
    // =========================================================================

    /// Storage, cache and live feed stitched into one gapless sequence.
    #[tokio::test]
    async fn test_pending_stream_end_to_end() {
        init_test_logging();
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        for slot in [32, 33, 36, 40] {
            chain.store.insert_canonical(make_block(slot, 0));
        }
        chain.store.set_finalized(Checkpoint::new(
            1,
            make_block(32, 0).block_root().unwrap(),
        ));
        chain.store.insert_canonical(make_block(64, 0));
        chain.store.insert_canonical(make_block(65, 0));
        chain.pending.insert(make_block(67, 0));
        chain.pending.insert(make_block(66, 0));
        let service = Arc::new(chain.service());

        let (handle, stream_signal) = CancelSignal::pair();
        let (mut rx, task) = spawn_pending_stream(
            &service,
            StreamPendingBlocksRequest {
                from_slot: 40,
                verified_only: false,
            },
            StreamContext::new(CancelSignal::never(), stream_signal),
        );

        // Whole of the start epoch, then the unfinalized gap, then the cache
        assert_eq!(
            collect_slots(&mut rx, 8).await,
            vec![32, 33, 36, 40, 64, 65, 66, 67]
        );

        wait_for_subscribers(&chain, 1).await;
        let sibling = make_block(69, 1);
        chain.bus.publish(BlockchainEvent::unconfirmed(make_block(68, 0))).await;
        // Already sent from the cache
        chain.bus.publish(BlockchainEvent::received(make_block(67, 0))).await;
        chain.bus.publish(BlockchainEvent::received(make_block(69, 0))).await;
        chain.bus.publish(BlockchainEvent::received(sibling.clone())).await;
        // Older than what the consumer already has
        chain.bus.publish(BlockchainEvent::received(make_block(50, 0))).await;
        // Not subscribed to in received mode
        chain.bus.publish(processed(70)).await;
        chain.bus.publish(BlockchainEvent::received(make_block(71, 0))).await;

        let live: Vec<BlockRecord> = {
            let mut out = Vec::new();
            for _ in 0..4 {
                out.push(next_record(&mut rx).await);
            }
            out
        };
        assert_eq!(
            live.iter().map(|r| r.slot).collect::<Vec<_>>(),
            vec![68, 69, 69, 71]
        );
        assert_eq!(live[2].root, sibling.block_root().unwrap());
        assert!(live.iter().all(|r| !r.is_canonical));

        handle.cancel();
        let reason = timeout(WAIT, task).await.unwrap().unwrap();
        assert_eq!(
            reason,
            ChainQueryError::Canceled("Stream context canceled".to_string())
        );
        assert_eq!(chain.bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_pending_stream_backfill_is_canonical_annotated() {
        init_test_logging();
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        chain.store.insert_canonical(make_block(3, 0));
        chain.store.insert(make_block(3, 1));
        chain.store.set_finalized(Checkpoint::new(0, [0u8; 32]));
        let service = Arc::new(chain.service());

        let (handle, stream_signal) = CancelSignal::pair();
        let (mut rx, _task) = spawn_pending_stream(
            &service,
            StreamPendingBlocksRequest::default(),
            StreamContext::new(CancelSignal::never(), stream_signal),
        );

        // Genesis is never replayed
        let first = next_record(&mut rx).await;
        let second = next_record(&mut rx).await;
        assert_eq!((first.slot, second.slot), (3, 3));
        assert_eq!(
            [first.is_canonical, second.is_canonical]
                .iter()
                .filter(|c| **c)
                .count(),
            1
        );
        handle.cancel();
    }

    #[tokio::test]
    async fn test_concurrent_streams_are_independent() {
        init_test_logging();
        let chain = TestChain::new();
        let service = Arc::new(chain.service());

        let (first_handle, first_signal) = CancelSignal::pair();
        let (second_handle, second_signal) = CancelSignal::pair();
        let (_first_rx, first_task) = spawn_pending_stream(
            &service,
            StreamPendingBlocksRequest::default(),
            StreamContext::new(CancelSignal::never(), first_signal),
        );
        let (mut second_rx, _second_task) = spawn_pending_stream(
            &service,
            StreamPendingBlocksRequest::default(),
            StreamContext::new(CancelSignal::never(), second_signal),
        );
        wait_for_subscribers(&chain, 2).await;

        first_handle.cancel();
        let reason = timeout(WAIT, first_task).await.unwrap().unwrap();
        assert_eq!(reason.code(), ErrorCode::Canceled);
        wait_for_subscribers(&chain, 1).await;

        // Past the replayed epoch 0
        chain.bus.publish(BlockchainEvent::received(make_block(40, 0))).await;
        assert_eq!(next_record(&mut second_rx).await.slot, 40);
        second_handle.cancel();
    }

    // =========================================================================
    // BLOCK STREAM
    // =========================================================================

    #[tokio::test]
    async fn test_received_blocks_signature_checked() {
        init_test_logging();
        let chain = TestChain::new();
        chain.verifier.reject_slot(5);
        let service = Arc::new(chain.service());

        let (handle, stream_signal) = CancelSignal::pair();
        let (mut rx, _task) = spawn_block_stream(
            &service,
            StreamBlocksRequest {
                verified_only: false,
            },
            StreamContext::new(CancelSignal::never(), stream_signal),
        );
        wait_for_subscribers(&chain, 1).await;

        chain.bus.publish(BlockchainEvent::received(make_block(5, 0))).await;
        chain.bus.publish(BlockchainEvent::received(make_block(6, 0))).await;
        chain.bus.publish(BlockchainEvent::received(make_block(4, 0))).await;
        chain.bus.publish(BlockchainEvent::received(make_block(7, 0))).await;

        assert_eq!(collect_slots(&mut rx, 2).await, vec![6, 7]);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_verified_stream_ignores_gossip() {
        init_test_logging();
        let chain = TestChain::new();
        let service = Arc::new(chain.service());

        let (handle, stream_signal) = CancelSignal::pair();
        let (mut rx, _task) = spawn_block_stream(
            &service,
            StreamBlocksRequest {
                verified_only: true,
            },
            StreamContext::new(CancelSignal::never(), stream_signal),
        );
        wait_for_subscribers(&chain, 1).await;

        chain.bus.publish(BlockchainEvent::received(make_block(3, 0))).await;
        chain.bus.publish(processed(4)).await;

        assert_eq!(collect_slots(&mut rx, 1).await, vec![4]);
        handle.cancel();
    }

    #[tokio::test]
    async fn test_forced_close_aborts_stream() {
        init_test_logging();
        let chain = TestChain::new();
        let service = Arc::new(chain.service());

        let (_handle, stream_signal) = CancelSignal::pair();
        let (_rx, task) = spawn_block_stream(
            &service,
            StreamBlocksRequest::default(),
            StreamContext::new(CancelSignal::never(), stream_signal),
        );
        wait_for_subscribers(&chain, 1).await;
        assert_eq!(chain.bus.close_all(), 1);

        let reason = timeout(WAIT, task).await.unwrap().unwrap();
        assert_eq!(
            reason,
            ChainQueryError::Aborted("Subscriber closed, exiting stream".to_string())
        );
        assert_eq!(chain.bus.subscriber_count(), 0);
    }

    // =========================================================================
    // CHAIN HEAD STREAM
    // =========================================================================

    #[tokio::test]
    async fn test_chain_head_stream_until_consumer_leaves() {
        init_test_logging();
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        chain.head.set_head(Some(make_block(10, 0)));
        let service = Arc::new(chain.service());
        let sink: Arc<RecordingSink<ChainHeadSummary>> = Arc::new(RecordingSink::accepting(1));

        let task = {
            let service = service.clone();
            let sink = sink.clone();
            tokio::spawn(async move {
                service
                    .stream_chain_head(
                        sink.as_ref(),
                        StreamContext::new(CancelSignal::never(), CancelSignal::never()),
                    )
                    .await
            })
        };
        wait_for_subscribers(&chain, 1).await;

        chain.bus.publish(processed(10)).await;
        timeout(WAIT, async {
            while sink.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("first head never sent");
        chain.head.set_head(Some(make_block(11, 0)));
        chain.bus.publish(processed(11)).await;

        let reason = timeout(WAIT, task).await.unwrap().unwrap();
        assert_eq!(reason.code(), ErrorCode::Unavailable);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink.items()[0].head_slot, 10);
        assert_eq!(chain.bus.subscriber_count(), 0);
    }

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    #[tokio::test]
    async fn test_server_shutdown_ends_every_stream() {
        init_test_logging();
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        chain.head.set_head(Some(make_block(1, 0)));
        let service = Arc::new(chain.service());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let (_blocks_rx, blocks_task) = spawn_block_stream(
            &service,
            StreamBlocksRequest::default(),
            StreamContext::new(CancelSignal::new(shutdown_rx.clone()), CancelSignal::never()),
        );
        let head_task = {
            let service = service.clone();
            let ctx = StreamContext::new(CancelSignal::new(shutdown_rx), CancelSignal::never());
            tokio::spawn(async move {
                let (tx, _rx) = mpsc::channel::<ChainHeadSummary>(4);
                service.stream_chain_head(&tx, ctx).await
            })
        };
        wait_for_subscribers(&chain, 2).await;

        shutdown_tx.send(true).unwrap();

        for task in [blocks_task, head_task] {
            let reason = timeout(WAIT, task).await.unwrap().unwrap();
            assert_eq!(
                reason,
                ChainQueryError::Canceled("Server context canceled".to_string())
            );
        }
        assert_eq!(chain.bus.subscriber_count(), 0);
    }
}
