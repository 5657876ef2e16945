//! # Request/Response Flows
//!
//! List blocks, chain head and weak subjectivity reads against a store
//! populated the way block import leaves it.

#[cfg(test)]
mod tests {
    use super::super::init_test_logging;
    use qc_18_chain_query::domain::ForkBlock;
    use qc_18_chain_query::ports::HeadState;
    use qc_18_chain_query::test_utils::{make_block, TestChain};
    use qc_18_chain_query::{
        BlockFilter, ChainQueryApi, ChainQueryError, Checkpoint, ErrorCode, ListBlocksRequest,
        V1Alpha1Projection, V1Projection,
    };
    use shared_types::{ForkVersion, Slot};

    const GWEI: u64 = 1_000_000_000;
    const NO_BLOCKS: [Slot; 0] = [];

    // =========================================================================
    // FIXTURES
    // =========================================================================

    /// Genesis plus one canonical block per slot in `slots`, and a fork
    /// sibling at slot 35.
    fn populated_chain(slots: impl IntoIterator<Item = Slot>) -> TestChain {
        init_test_logging();
        let chain = TestChain::new();
        chain.store.insert_genesis(make_block(0, 0));
        for slot in slots {
            chain.store.insert_canonical(make_block(slot, 0));
        }
        chain.store.insert(make_block(35, 7));
        chain
    }

    // =========================================================================
    // LIST BLOCKS
    // =========================================================================

    #[tokio::test]
    async fn test_walk_every_page_of_an_epoch() {
        let chain = populated_chain(32..64);
        let service = chain.service();

        let mut token = String::new();
        let mut seen = Vec::new();
        loop {
            let page = service
                .list_blocks(ListBlocksRequest::new(BlockFilter::Epoch(1)).with_page(token, 10))
                .await
                .unwrap();
            assert_eq!(page.total_size, 33);
            seen.extend(page.items.iter().map(|r| (r.slot, r.is_canonical)));
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }

        assert_eq!(seen.len(), 33);
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
        // The fork sibling is listed but not canonical
        assert_eq!(seen.iter().filter(|(_, canonical)| !canonical).count(), 1);
    }

    #[tokio::test]
    async fn test_default_page_size_applies() {
        let chain = populated_chain(32..64);
        let service = chain.service();

        let page = service
            .list_blocks(ListBlocksRequest::new(BlockFilter::Epoch(1)))
            .await
            .unwrap();
        assert_eq!(page.items.len(), 33);
        assert_eq!(page.next_page_token, "");
    }

    #[tokio::test]
    async fn test_list_errors_carry_rpc_codes() {
        let chain = populated_chain(32..40);
        let service = chain.service();

        let too_big = service
            .list_blocks(ListBlocksRequest::new(BlockFilter::Epoch(1)).with_page("", 1000))
            .await
            .unwrap_err();
        assert_eq!(too_big.code().rpc_code(), -32602);

        let bad_token = service
            .list_blocks(ListBlocksRequest::new(BlockFilter::Epoch(1)).with_page("abc", 5))
            .await
            .unwrap_err();
        assert_eq!(bad_token.code(), ErrorCode::Internal);
        assert!(bad_token.message().starts_with("Could not paginate blocks"));
    }

    #[tokio::test]
    async fn test_containers_serialize_for_the_wire() {
        let chain = populated_chain([33]);
        let mut bellatrix = make_block(40, 0);
        bellatrix.fork = ForkVersion::Bellatrix;
        chain.store.insert_canonical(bellatrix.blinded());
        let service = chain.service();

        let page = service
            .list_block_containers::<V1Alpha1Projection>(ListBlocksRequest::new(
                BlockFilter::Slot(40),
            ))
            .await
            .unwrap();
        assert!(matches!(page.items[0].block, ForkBlock::BlindedBellatrix(_)));

        let json = serde_json::to_value(&page.items[0]).unwrap();
        assert_eq!(json["canonical"], serde_json::Value::Bool(true));

        let v1 = service
            .list_block_containers::<V1Projection>(ListBlocksRequest::new(BlockFilter::Slot(40)))
            .await
            .unwrap_err();
        assert_eq!(v1.code(), ErrorCode::Internal);
        assert!(v1.message().starts_with("Could not get block container"));
    }

    // =========================================================================
    // CHAIN HEAD
    // =========================================================================

    #[tokio::test]
    async fn test_chain_head_after_finalization() {
        let chain = populated_chain([32, 64, 96, 100]);
        let root_at = |slot| make_block(slot, 0).block_root().unwrap();
        chain.store.set_finalized(Checkpoint::new(1, root_at(32)));
        chain.store.set_justified(Checkpoint::new(3, root_at(96)));
        chain.store.set_previous_justified(Checkpoint::new(2, root_at(64)));
        chain.head.set_head(Some(make_block(100, 0)));
        let service = chain.service();

        let head = service.get_chain_head().await.unwrap();
        assert_eq!(head.head_slot, 100);
        assert_eq!(head.head_epoch, 3);
        assert_eq!(head.head_root, root_at(100));
        assert_eq!(head.finalized_slot, 32);
        assert_eq!(head.justified_slot, 96);
        assert_eq!(head.previous_justified_slot, 64);
        assert!(!head.optimistic_status);
    }

    #[tokio::test]
    async fn test_chain_head_with_pruned_checkpoint_block() {
        let chain = populated_chain([100]);
        chain.store.set_finalized(Checkpoint::new(1, [0x99; 32]));
        chain.head.set_head(Some(make_block(100, 0)));

        let err = chain.service().get_chain_head().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert!(err.message().contains("finalized"));
    }

    #[tokio::test]
    async fn test_chain_head_without_head() {
        let chain = populated_chain(NO_BLOCKS);
        let err = chain.service().get_chain_head().await.unwrap_err();
        assert_eq!(
            err,
            ChainQueryError::NotFound("Head block of chain was nil".to_string())
        );
    }

    // =========================================================================
    // WEAK SUBJECTIVITY
    // =========================================================================

    #[tokio::test]
    async fn test_weak_subjectivity_checkpoint() {
        // 1024 full validators: period 268; finalized 600 -> epoch 536
        let chain = populated_chain(NO_BLOCKS);
        let mut below = make_block(536 * 32 - 2, 0);
        below.message.state_root = [0x42; 32];
        chain.store.insert_canonical(below.clone());
        chain.head.set_state(HeadState {
            slot: 600 * 32,
            finalized_checkpoint: Checkpoint::new(600, [1u8; 32]),
            active_validator_count: 1024,
            total_active_balance: 1024 * 32 * GWEI,
        });

        let ws = chain.service().get_weak_subjectivity_checkpoint().await.unwrap();
        assert_eq!(ws.epoch, 536);
        // Highest canonical block at or below the period start slot
        assert_eq!(ws.block_root, below.block_root().unwrap());
        assert_eq!(ws.state_root, [0x42; 32]);
    }

    #[tokio::test]
    async fn test_weak_subjectivity_without_head_state() {
        let chain = populated_chain(NO_BLOCKS);
        chain.head.clear_state();

        let err = chain
            .service()
            .get_weak_subjectivity_checkpoint()
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
