//! # Integration Flows
//!
//! Every test builds a `TestChain`, wires a `ChainQueryService` over it and
//! talks to the service only through `ChainQueryApi`.

pub mod flows;
pub mod streams;

use qc_18_chain_query::error::SinkError;
use qc_18_chain_query::StreamSink;
use parking_lot::Mutex;
use quantum_telemetry::{LogFormat, TelemetryConfig};

/// Install the test log subscriber once per binary.
pub fn init_test_logging() {
    let config = TelemetryConfig::for_service("qc-tests")
        .with_filter("qc_18_chain_query=debug,shared_bus=debug")
        .with_format(LogFormat::Off);
    // Only the first test to get here installs it
    let _ = quantum_telemetry::init_logging(&config);
}

/// Sink that keeps everything it is sent and can be told to hang up.
pub struct RecordingSink<T> {
    items: Mutex<Vec<T>>,
    accept: usize,
}

impl<T: Clone> RecordingSink<T> {
    pub fn new() -> Self {
        Self::accepting(usize::MAX)
    }

    /// Accept `accept` items, then fail every send.
    pub fn accepting(accept: usize) -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            accept,
        }
    }

    pub fn items(&self) -> Vec<T> {
        self.items.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl<T: Clone> Default for RecordingSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T: Send + 'static> StreamSink<T> for RecordingSink<T> {
    async fn send(&self, item: T) -> Result<(), SinkError> {
        let mut items = self.items.lock();
        if items.len() >= self.accept {
            return Err(SinkError);
        }
        items.push(item);
        Ok(())
    }
}
