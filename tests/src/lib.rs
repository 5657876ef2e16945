//! # Chain Query Test Suite
//!
//! Cross-crate tests driving the chain query service through its public
//! API, with the in-memory bus, block store and pending cache behind it.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/
//! │   ├── flows.rs      # list, chain head, weak subjectivity, projections
//! │   └── streams.rs    # block, pending-block and chain head streams
//! └── benches/
//!     └── chain_query_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::streams::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(dead_code)]

pub mod integration;
