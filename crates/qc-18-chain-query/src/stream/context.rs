//! Cancellation contexts for streaming calls.

use std::sync::Arc;
use tokio::sync::watch;

/// One cancellation source.
///
/// Fires when its flag is set to `true` or when every sender is dropped.
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
    // Held only by `never()` so the sender outlives the signal
    _keepalive: Option<Arc<watch::Sender<bool>>>,
}

impl CancelSignal {
    /// Wrap an existing shutdown receiver.
    pub fn new(rx: watch::Receiver<bool>) -> Self {
        Self {
            rx,
            _keepalive: None,
        }
    }

    /// A connected handle and signal.
    pub fn pair() -> (CancelHandle, Self) {
        let (tx, rx) = watch::channel(false);
        (CancelHandle { tx }, Self::new(rx))
    }

    /// A signal that never fires.
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _keepalive: Some(Arc::new(tx)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Sending side of a [`CancelSignal`]. Dropping it also cancels.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The two independent cancellation sources of a streaming call.
#[derive(Debug, Clone)]
pub struct StreamContext {
    /// Server-wide shutdown
    pub server: CancelSignal,
    /// This client's call
    pub stream: CancelSignal,
}

impl StreamContext {
    pub fn new(server: CancelSignal, stream: CancelSignal) -> Self {
        Self { server, stream }
    }
}
