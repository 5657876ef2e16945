//! Delivery cursor for a single block stream.

use shared_types::{Hash, Slot};

/// Boundary between delivered and undelivered blocks of one stream.
///
/// A block is admitted when its slot is past the last delivered slot, or
/// equal to it with a root not yet delivered at that slot. Delivered slots
/// are therefore non-decreasing and no (slot, root) pair goes out twice,
/// while sibling blocks at the same slot still get through.
#[derive(Debug, Clone, Default)]
pub struct StreamCursor {
    last_sent_slot: Option<Slot>,
    roots_at_last_slot: Vec<Hash>,
    /// Last slot was skipped over, so nothing more is admitted at it
    sealed: bool,
}

impl StreamCursor {
    /// Cursor that admits every block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor that treats every slot up to and including `slot` as delivered.
    pub fn after(slot: Slot) -> Self {
        Self {
            last_sent_slot: Some(slot),
            roots_at_last_slot: Vec::new(),
            sealed: true,
        }
    }

    pub fn last_sent_slot(&self) -> Option<Slot> {
        self.last_sent_slot
    }

    /// First slot that is still entirely undelivered.
    pub fn next_slot(&self) -> Slot {
        self.last_sent_slot.map_or(0, |s| s.saturating_add(1))
    }

    pub fn admits(&self, slot: Slot, root: &Hash) -> bool {
        match self.last_sent_slot {
            None => true,
            Some(last) if slot > last => true,
            Some(last) if slot == last => !self.sealed && !self.roots_at_last_slot.contains(root),
            Some(_) => false,
        }
    }

    /// Record a delivered block. Callers check [`Self::admits`] first.
    pub fn advance(&mut self, slot: Slot, root: Hash) {
        if self.last_sent_slot != Some(slot) {
            self.last_sent_slot = Some(slot);
            self.roots_at_last_slot.clear();
            self.sealed = false;
        }
        self.roots_at_last_slot.push(root);
    }

    /// Mark every slot up to `slot` delivered without sending anything.
    ///
    /// Never moves the cursor backwards.
    pub fn skip_to(&mut self, slot: Slot) {
        if self.last_sent_slot.map_or(true, |last| slot > last) {
            self.last_sent_slot = Some(slot);
            self.roots_at_last_slot.clear();
            self.sealed = true;
        }
    }
}
