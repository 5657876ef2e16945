//! # Feed Events
//!
//! Defines the events that flow through the block and state feeds.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Hash, SignedBeaconBlock, Slot};

/// Payload of a block received from the network or the sync service.
///
/// The block is optional because a malformed gossip message still produces
/// an event; consumers must skip events without a block.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReceivedBlockData {
    pub signed_block: Option<SignedBeaconBlock>,
}

/// Payload of a block that went through the state transition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BlockProcessedData {
    /// Slot of the processed block.
    pub slot: Slot,
    /// Root of the processed block.
    pub block_root: Hash,
    /// The decoded block, if the processor attached it.
    pub signed_block: Option<SignedBeaconBlock>,
    /// Whether the block was fully verified (not optimistic).
    pub verified: bool,
}

/// Payload of a block that entered the pending (unconfirmed) cache.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnconfirmedBlockData {
    pub signed_block: Option<SignedBeaconBlock>,
}

/// All events that can be published to the feeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BlockchainEvent {
    // =========================================================================
    // BLOCK FEED
    // =========================================================================
    /// A block arrived and passed gossip validation.
    ReceivedBlock(ReceivedBlockData),

    /// A block was placed in the pending-block cache awaiting its parent.
    UnconfirmedBlock(UnconfirmedBlockData),

    // =========================================================================
    // STATE FEED
    // =========================================================================
    /// A block was applied to the head state.
    BlockProcessed(BlockProcessedData),
}

impl BlockchainEvent {
    /// Get the feed this event is published on.
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::ReceivedBlock(_) | Self::UnconfirmedBlock(_) => EventTopic::BlockFeed,
            Self::BlockProcessed(_) => EventTopic::StateFeed,
        }
    }

    /// Get the kind tag of this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ReceivedBlock(_) => EventKind::ReceivedBlock,
            Self::UnconfirmedBlock(_) => EventKind::UnconfirmedBlock,
            Self::BlockProcessed(_) => EventKind::VerifiedBlock,
        }
    }

    /// The block carried by this event, if any.
    #[must_use]
    pub fn signed_block(&self) -> Option<&SignedBeaconBlock> {
        match self {
            Self::ReceivedBlock(data) => data.signed_block.as_ref(),
            Self::UnconfirmedBlock(data) => data.signed_block.as_ref(),
            Self::BlockProcessed(data) => data.signed_block.as_ref(),
        }
    }

    /// Convenience constructor for a received block.
    #[must_use]
    pub fn received(block: SignedBeaconBlock) -> Self {
        Self::ReceivedBlock(ReceivedBlockData {
            signed_block: Some(block),
        })
    }

    /// Convenience constructor for an unconfirmed block.
    #[must_use]
    pub fn unconfirmed(block: SignedBeaconBlock) -> Self {
        Self::UnconfirmedBlock(UnconfirmedBlockData {
            signed_block: Some(block),
        })
    }
}

/// Feeds a subscriber can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Received and unconfirmed blocks.
    BlockFeed,
    /// Processed blocks.
    StateFeed,
    /// All events (no filtering).
    All,
}

/// Kind tag of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    ReceivedBlock,
    VerifiedBlock,
    UnconfirmedBlock,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Kinds to include. Empty means all kinds.
    pub kinds: Vec<EventKind>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            kinds: Vec::new(),
        }
    }

    /// Create a filter for a single event kind.
    #[must_use]
    pub fn kind(kind: EventKind) -> Self {
        Self {
            topics: Vec::new(),
            kinds: vec![kind],
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &BlockchainEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let kind_match = self.kinds.is_empty() || self.kinds.contains(&event.kind());

        topic_match && kind_match
    }
}
