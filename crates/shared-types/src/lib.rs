//! # Shared Types Crate
//!
//! Value types shared by the chain-data service crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: block containers and slot/epoch aliases used
//!   by the event bus and the chain query subsystem are defined here.
//! - **Immutable Blocks**: a `SignedBeaconBlock` is never mutated after it is
//!   produced; consumers only annotate copies of it.
//! - **Deterministic Roots**: every block root is derived from the canonical
//!   encoding of the block message, never supplied by the caller.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
