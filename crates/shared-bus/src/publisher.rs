//! # Event Publisher
//!
//! Defines the publishing side of the feeds and the in-memory bus.

use crate::events::{BlockchainEvent, EventFilter};
use crate::subscriber::{Registry, SubscriberSlot, Subscription, SubscriptionId};
use crate::DEFAULT_MAILBOX_CAPACITY;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Trait for publishing events to the feeds.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish an event.
    ///
    /// Waits while a matching subscriber's mailbox is full.
    ///
    /// # Returns
    ///
    /// The number of subscribers that received the event.
    async fn publish(&self, event: BlockchainEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Trait for subscribing to the feeds.
pub trait EventSubscriber: Send + Sync {
    /// Subscribe to events matching a filter.
    fn subscribe(&self, filter: EventFilter) -> Subscription;
}

/// In-memory implementation of the feeds.
///
/// Each subscriber gets its own bounded `mpsc` mailbox plus a `watch`
/// close flag the bus raises to force it out.
pub struct InMemoryEventBus {
    /// Live subscribers by id.
    registry: Arc<Registry>,

    /// Next subscription id.
    next_id: AtomicU64,

    /// Total events published.
    events_published: AtomicU64,

    /// Mailbox capacity per subscriber.
    capacity: usize,
}

impl InMemoryEventBus {
    /// Create a new bus with the default mailbox capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAILBOX_CAPACITY)
    }

    /// Create a new bus with the given mailbox capacity (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
            events_published: AtomicU64::new(0),
            capacity: capacity.max(1),
        }
    }

    /// Force-close a subscriber.
    ///
    /// The subscriber observes `SubscriptionError::Closed` on its next
    /// receive. Returns false if no such subscriber is registered.
    pub fn close_subscriber(&self, id: SubscriptionId) -> bool {
        let Some(slot) = self.registry.lock().remove(&id) else {
            return false;
        };
        let _ = slot.closer.send(true);
        debug!(subscription = id, "Subscriber force-closed");
        true
    }

    /// Force-close every subscriber.
    pub fn close_all(&self) -> usize {
        let slots = std::mem::take(&mut *self.registry.lock());
        let count = slots.len();
        for slot in slots.into_values() {
            let _ = slot.closer.send(true);
        }
        debug!(closed = count, "All subscribers force-closed");
        count
    }

    /// Get the number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Get the mailbox capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, filter: EventFilter) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);
        let (closer, closed) = watch::channel(false);

        debug!(subscription = id, topics = ?filter.topics, kinds = ?filter.kinds, "New subscription created");

        self.registry.lock().insert(
            id,
            SubscriberSlot {
                sender,
                closer,
                filter,
            },
        );

        Subscription::new(id, receiver, closed, Arc::downgrade(&self.registry))
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: BlockchainEvent) -> usize {
        let topic = event.topic();
        let kind = event.kind();

        self.events_published.fetch_add(1, Ordering::Relaxed);

        // Never hold the registry lock across a send.
        let targets: Vec<(SubscriptionId, mpsc::Sender<BlockchainEvent>)> = self
            .registry
            .lock()
            .iter()
            .filter(|(_, slot)| slot.filter.matches(&event))
            .map(|(id, slot)| (*id, slot.sender.clone()))
            .collect();

        let mut delivered = 0;
        for (id, sender) in targets {
            match sender.send(event.clone()).await {
                Ok(()) => delivered += 1,
                Err(_) => debug!(subscription = id, "Subscriber released before delivery"),
            }
        }

        debug!(topic = ?topic, kind = ?kind, receivers = delivered, "Event published");
        delivered
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}
