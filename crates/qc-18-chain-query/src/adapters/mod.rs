//! # Adapters Layer (Hexagonal Architecture)
//!
//! In-memory implementations of the outbound ports. The node wires its
//! real storage and fork-choice behind the same traits.

pub mod memory;

pub use memory::{InMemoryBlockStore, InMemoryPendingBlocks, StaticHeadProvider};
