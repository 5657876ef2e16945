//! # Shared Bus - Block and State Feeds
//!
//! In-process publish/subscribe feeds that announce blocks as they move
//! through the node.
//!
//! ## Feeds
//!
//! ```text
//! Gossip / sync ──ReceivedBlock────→ ┐
//!                                    ├── Block feed ──→ subscribers
//! Pending cache ─UnconfirmedBlock──→ ┘
//!
//! State transition ─BlockProcessed─→ State feed ──→ subscribers
//! ```
//!
//! ## Delivery Rules
//!
//! - Events reach each subscriber in publish order.
//! - Each subscriber owns a bounded mailbox (one pending event by default).
//!   A publisher that outpaces a slow subscriber waits at publish time; the
//!   feed never drops an event for a live subscriber.
//! - A `Subscription` is a single-owner handle. It is released exactly once,
//!   either by `unsubscribe()` or when it is dropped.
//! - The bus may force-close a subscriber; the subscriber observes this as
//!   `SubscriptionError::Closed` on its next receive.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use events::{
    BlockProcessedData, BlockchainEvent, EventFilter, EventKind, EventTopic, ReceivedBlockData,
    UnconfirmedBlockData,
};
pub use publisher::{EventPublisher, EventSubscriber, InMemoryEventBus};
pub use subscriber::{Subscription, SubscriptionError, SubscriptionId};

/// Events buffered per subscriber before the publisher has to wait.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 1;
