//! Ports (hexagonal architecture boundaries)

pub mod inbound;
pub mod outbound;

pub use inbound::{ChainQueryApi, StreamBlocksRequest, StreamPendingBlocksRequest};
pub use outbound::{
    BlockSignatureVerifier, BlockStore, CanonicalChainOracle, FinalizationProvider, HeadProvider,
    HeadState, PendingBlockCache, StreamSink,
};
