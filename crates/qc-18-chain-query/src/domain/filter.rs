//! List request filters and result pages.

use super::block::BlockRecord;
use serde::{Deserialize, Serialize};
use shared_types::{Epoch, Hash, Slot};

/// Selects which blocks a list request returns.
///
/// Exactly one criterion applies per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockFilter {
    /// All blocks whose slot falls in the epoch
    Epoch(Epoch),
    /// The block with this root, if stored
    Root(Hash),
    /// All blocks stored at the slot
    Slot(Slot),
    /// The genesis block
    Genesis,
}

impl BlockFilter {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Epoch(_) => "epoch",
            Self::Root(_) => "root",
            Self::Slot(_) => "slot",
            Self::Genesis => "genesis",
        }
    }
}

/// A list blocks request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListBlocksRequest {
    /// Missing filter is rejected with `InvalidArgument`
    pub filter: Option<BlockFilter>,
    /// Decimal page index; empty means the first page
    pub page_token: String,
    /// Zero selects the configured default page size
    pub page_size: usize,
}

impl ListBlocksRequest {
    pub fn new(filter: BlockFilter) -> Self {
        Self {
            filter: Some(filter),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, page_token: impl Into<String>, page_size: usize) -> Self {
        self.page_token = page_token.into();
        self.page_size = page_size;
        self
    }
}

/// One page of a list result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole match set before pagination
    pub total_size: usize,
    /// Token for the next page; empty on the last page
    pub next_page_token: String,
}

impl<T> Page<T> {
    /// A page with no matches.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_size: 0,
            next_page_token: "0".to_string(),
        }
    }

    /// Convert every item, keeping the paging fields.
    pub fn try_map<U, E>(self, f: impl FnMut(T) -> Result<U, E>) -> Result<Page<U>, E> {
        Ok(Page {
            items: self.items.into_iter().map(f).collect::<Result<_, _>>()?,
            total_size: self.total_size,
            next_page_token: self.next_page_token,
        })
    }
}

/// Page of block records.
pub type BlockPage = Page<BlockRecord>;
