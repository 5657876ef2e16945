//! Block query engine: filter dispatch, pagination and canonical annotation.

use crate::domain::{
    start_and_end_page, BlockFilter, BlockPage, BlockRecord, ChainQueryConfig, ListBlocksRequest,
    Page,
};
use crate::error::{ChainQueryError, ChainQueryResult};
use crate::metrics;
use crate::ports::outbound::{BlockStore, CanonicalChainOracle};
use shared_types::{Epoch, Hash, SignedBeaconBlock, Slot};
use std::sync::Arc;
use tracing::debug;

/// Resolves list requests against the block store.
///
/// Also serves the historical reads of the stream reconciler, so every
/// storage-sourced block carries the same canonical annotation.
pub struct BlockQueryEngine {
    store: Arc<dyn BlockStore>,
    canonical: Arc<dyn CanonicalChainOracle>,
    max_page_size: usize,
    default_page_size: usize,
}

impl BlockQueryEngine {
    pub fn new(
        store: Arc<dyn BlockStore>,
        canonical: Arc<dyn CanonicalChainOracle>,
        config: &ChainQueryConfig,
    ) -> Self {
        Self {
            store,
            canonical,
            max_page_size: config.max_page_size,
            default_page_size: config.default_page_size,
        }
    }

    /// Resolve one page of a list request.
    ///
    /// Empty root and slot matches are an empty page, not an error. A
    /// missing genesis block is `NotFound`.
    pub async fn list(&self, request: &ListBlocksRequest) -> ChainQueryResult<BlockPage> {
        if request.page_size > self.max_page_size {
            return Err(ChainQueryError::InvalidArgument(format!(
                "Requested page size {} can not be greater than max size {}",
                request.page_size, self.max_page_size
            )));
        }
        let Some(filter) = request.filter else {
            return Err(ChainQueryError::InvalidArgument(
                "Must specify a filter criteria for fetching blocks".to_string(),
            ));
        };
        metrics::record_list_request(filter.label());

        let page_size = if request.page_size == 0 {
            self.default_page_size
        } else {
            request.page_size
        };

        let page = match filter {
            BlockFilter::Epoch(epoch) => {
                let blocks = self
                    .store
                    .blocks_by_epoch_range(epoch, epoch)
                    .await
                    .map_err(|e| ChainQueryError::internal("Could not get blocks", e))?;
                self.paginate(blocks, &request.page_token, page_size).await?
            }
            BlockFilter::Slot(slot) => {
                let blocks = self.store.blocks_by_slot(slot).await.map_err(|e| {
                    ChainQueryError::internal(
                        &format!("Could not retrieve blocks for slot {slot}"),
                        e,
                    )
                })?;
                self.paginate(blocks, &request.page_token, page_size).await?
            }
            BlockFilter::Root(root) => self.list_for_root(&root).await?,
            BlockFilter::Genesis => self.list_for_genesis().await?,
        };

        debug!(
            filter = filter.label(),
            returned = page.items.len(),
            total = page.total_size,
            "[qc-18] Listed blocks"
        );
        Ok(page)
    }

    async fn paginate(
        &self,
        blocks: Vec<SignedBeaconBlock>,
        page_token: &str,
        page_size: usize,
    ) -> ChainQueryResult<BlockPage> {
        let total_size = blocks.len();
        if total_size == 0 {
            return Ok(Page::empty());
        }

        let bounds = start_and_end_page(page_token, page_size, total_size)
            .map_err(|e| ChainQueryError::internal("Could not paginate blocks", e))?;

        let mut items = Vec::with_capacity(bounds.end - bounds.start);
        for block in blocks
            .into_iter()
            .skip(bounds.start)
            .take(bounds.end - bounds.start)
        {
            items.push(self.annotate(block).await?);
        }

        Ok(Page {
            items,
            total_size,
            next_page_token: bounds.next_page_token,
        })
    }

    async fn list_for_root(&self, root: &Hash) -> ChainQueryResult<BlockPage> {
        let block = self
            .store
            .block_by_root(root)
            .await
            .map_err(|e| ChainQueryError::internal("Could not retrieve block", e))?;
        let Some(block) = block else {
            return Ok(Page::empty());
        };

        Ok(Page {
            items: vec![self.annotate(block).await?],
            total_size: 1,
            next_page_token: "0".to_string(),
        })
    }

    async fn list_for_genesis(&self) -> ChainQueryResult<BlockPage> {
        let genesis = self.store.genesis_block().await.map_err(|e| {
            ChainQueryError::internal("Could not retrieve blocks for genesis slot", e)
        })?;
        let Some(genesis) = genesis else {
            return Err(ChainQueryError::NotFound(
                "Could not find genesis block".to_string(),
            ));
        };

        let record = BlockRecord::from_signed(genesis)?.with_canonical(true);
        Ok(Page {
            items: vec![record],
            total_size: 1,
            next_page_token: "0".to_string(),
        })
    }

    /// Hash a stored block and attach its canonical status.
    pub async fn annotate(&self, block: SignedBeaconBlock) -> ChainQueryResult<BlockRecord> {
        let record = BlockRecord::from_signed(block)?;
        let canonical = self.canonical.is_canonical(&record.root).await.map_err(|e| {
            ChainQueryError::internal("Could not determine if block is canonical", e)
        })?;
        Ok(record.with_canonical(canonical))
    }

    /// Annotated blocks of the epochs `[start, end]`.
    pub async fn blocks_in_epochs(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> ChainQueryResult<Vec<BlockRecord>> {
        let blocks = self
            .store
            .blocks_by_epoch_range(start, end)
            .await
            .map_err(|e| ChainQueryError::internal("Could not get blocks", e))?;
        self.annotate_all(blocks).await
    }

    /// Annotated blocks with slot in `[start, end]`.
    pub async fn blocks_in_slots(
        &self,
        start: Slot,
        end: Slot,
    ) -> ChainQueryResult<Vec<BlockRecord>> {
        let blocks = self
            .store
            .blocks_by_slot_range(start, end)
            .await
            .map_err(|e| {
                ChainQueryError::internal(
                    &format!("Could not get blocks for slots {start}..={end}"),
                    e,
                )
            })?;
        self.annotate_all(blocks).await
    }

    async fn annotate_all(
        &self,
        blocks: Vec<SignedBeaconBlock>,
    ) -> ChainQueryResult<Vec<BlockRecord>> {
        let mut records = Vec::with_capacity(blocks.len());
        for block in blocks {
            records.push(self.annotate(block).await?);
        }
        Ok(records)
    }
}
