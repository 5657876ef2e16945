//! Domain layer for Chain Query
//!
//! Pure types and arithmetic; no I/O.

pub mod block;
pub mod checkpoint;
pub mod config;
pub mod cursor;
pub mod filter;
pub mod pagination;
pub mod projection;
pub mod slots;
pub mod weak_subjectivity;

pub use block::BlockRecord;
pub use checkpoint::{ChainHeadSummary, Checkpoint, WeakSubjectivityCheckpoint};
pub use config::{ChainQueryConfig, ConfigError, WeakSubjectivityConfig};
pub use cursor::StreamCursor;
pub use filter::{BlockFilter, BlockPage, ListBlocksRequest, Page};
pub use pagination::{start_and_end_page, PageBounds, PaginationError};
pub use projection::{
    ContainerProjection, ForkBlock, ProjectionError, SignedBlockBody, V1Alpha1Container,
    V1Alpha1Projection, V1Container, V1Projection,
};
pub use weak_subjectivity::WeakSubjectivityError;
