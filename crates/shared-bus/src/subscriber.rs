//! # Event Subscriber
//!
//! Defines the subscription side of the feeds.

use crate::events::{BlockchainEvent, EventFilter};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Weak;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Identifier of a subscription within one bus.
pub type SubscriptionId = u64;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The subscriber was force-closed or the bus was dropped.
    #[error("Subscriber closed")]
    Closed,
}

/// Publisher-side half of a subscription, owned by the bus registry.
pub(crate) struct SubscriberSlot {
    pub(crate) sender: mpsc::Sender<BlockchainEvent>,
    pub(crate) closer: watch::Sender<bool>,
    pub(crate) filter: EventFilter,
}

pub(crate) type Registry = Mutex<BTreeMap<SubscriptionId, SubscriberSlot>>;

/// A single-owner handle for receiving events.
///
/// The handle is released exactly once: explicitly through
/// [`Subscription::unsubscribe`] or implicitly on drop, whichever happens
/// first. After release the bus no longer delivers to it.
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<BlockchainEvent>,
    closed: watch::Receiver<bool>,
    registry: Weak<Registry>,
    released: bool,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        receiver: mpsc::Receiver<BlockchainEvent>,
        closed: watch::Receiver<bool>,
        registry: Weak<Registry>,
    ) -> Self {
        Self {
            id,
            receiver,
            closed,
            registry,
            released: false,
        }
    }

    /// Identifier assigned by the bus.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Receive the next event.
    ///
    /// # Returns
    ///
    /// - `Ok(event)` - The next event in publish order
    /// - `Err(SubscriptionError::Closed)` - The bus force-closed this
    ///   subscriber, or the bus itself was dropped
    pub async fn recv(&mut self) -> Result<BlockchainEvent, SubscriptionError> {
        if self.released {
            return Err(SubscriptionError::Closed);
        }
        tokio::select! {
            biased;
            _ = wait_closed(&mut self.closed) => Err(SubscriptionError::Closed),
            event = self.receiver.recv() => event.ok_or(SubscriptionError::Closed),
        }
    }

    /// Resolves once the bus force-closes this subscriber.
    pub async fn closed(&mut self) {
        wait_closed(&mut self.closed).await;
    }

    /// Release the subscription.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.id);
        }
        debug!(subscription = self.id, "Subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

/// Wait until the close flag is raised or its sender goes away.
async fn wait_closed(closed: &mut watch::Receiver<bool>) {
    loop {
        if *closed.borrow_and_update() {
            return;
        }
        if closed.changed().await.is_err() {
            return;
        }
    }
}
