//! # Chain Query Metrics
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-chain-query = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `chain_query_active_streams` - Gauge of open streaming calls
//! - `chain_query_blocks_streamed_total` - Blocks sent to consumers (by phase)
//! - `chain_query_events_skipped_total` - Live events dropped without ending the stream (by reason)
//! - `chain_query_list_requests_total` - List blocks requests (by filter)

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref ACTIVE_STREAMS: IntGauge = register_int_gauge!(
        "chain_query_active_streams",
        "Number of open streaming calls"
    )
    .expect("Failed to create ACTIVE_STREAMS metric");

    pub static ref BLOCKS_STREAMED: IntCounterVec = register_int_counter_vec!(
        "chain_query_blocks_streamed_total",
        "Blocks sent to stream consumers",
        &["phase"]
    )
    .expect("Failed to create BLOCKS_STREAMED metric");

    pub static ref EVENTS_SKIPPED: IntCounterVec = register_int_counter_vec!(
        "chain_query_events_skipped_total",
        "Live events skipped without ending the stream",
        &["reason"]
    )
    .expect("Failed to create EVENTS_SKIPPED metric");

    pub static ref LIST_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "chain_query_list_requests_total",
        "List blocks requests",
        &["filter"]
    )
    .expect("Failed to create LIST_REQUESTS metric");
}

#[cfg(feature = "metrics")]
pub fn record_stream_opened() {
    ACTIVE_STREAMS.inc();
}

#[cfg(feature = "metrics")]
pub fn record_stream_closed() {
    ACTIVE_STREAMS.dec();
}

#[cfg(feature = "metrics")]
pub fn record_block_streamed(phase: &str) {
    BLOCKS_STREAMED.with_label_values(&[phase]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_skipped(reason: &str) {
    EVENTS_SKIPPED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_list_request(filter: &str) {
    LIST_REQUESTS.with_label_values(&[filter]).inc();
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_stream_opened() {}

#[cfg(not(feature = "metrics"))]
pub fn record_stream_closed() {}

#[cfg(not(feature = "metrics"))]
pub fn record_block_streamed(_phase: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_skipped(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_list_request(_filter: &str) {}
