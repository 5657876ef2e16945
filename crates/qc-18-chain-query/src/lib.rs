//! # QC-18 Chain Query
//!
//! Read/query and live-notification layer over the node's chain data.
//!
//! **Subsystem ID:** 18
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - List stored blocks by epoch, slot, root or genesis, paginated and
//!   annotated with canonical status
//! - Snapshot the chain head with its finalized and justified checkpoints,
//!   each validated against storage
//! - Report the weak subjectivity checkpoint
//! - Stream blocks to a consumer across storage, the pending-block cache
//!   and the live feed with no gaps and no duplicates
//! - Stream chain head snapshots as blocks are processed
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-chain-query/
//! ├── domain/     # Records, checkpoints, filters, pagination, cursor, projection
//! ├── ports/      # ChainQueryApi + collaborator traits
//! ├── service/    # Query engine, head resolution, weak subjectivity
//! ├── stream/     # Live stream reconciler, chain head stream, cancellation
//! └── adapters/   # In-memory collaborators
//! ```
//!
//! ## Error Model
//!
//! Every failure surfaces as one [`ChainQueryError`] variant with a message
//! naming the step that failed. Streams return the error that ended them.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;
pub mod stream;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-exports
pub use domain::{
    BlockFilter, BlockPage, BlockRecord, ChainHeadSummary, ChainQueryConfig, Checkpoint,
    ConfigError, ContainerProjection, ListBlocksRequest, Page, StreamCursor, V1Alpha1Container,
    V1Alpha1Projection, V1Container, V1Projection, WeakSubjectivityCheckpoint,
};
pub use error::{ChainQueryError, ChainQueryResult, ErrorCode, StoreError};
pub use ports::{
    BlockSignatureVerifier, BlockStore, CanonicalChainOracle, ChainQueryApi, FinalizationProvider,
    HeadProvider, HeadState, PendingBlockCache, StreamBlocksRequest, StreamPendingBlocksRequest,
    StreamSink,
};
pub use service::{ChainQueryDependencies, ChainQueryService};
pub use stream::{CancelHandle, CancelSignal, StreamContext};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
