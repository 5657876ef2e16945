//! Block records as handed to consumers.

use serde::{Deserialize, Serialize};
use shared_types::{EncodingError, Hash, SignedBeaconBlock, Slot};

/// A block together with its root and canonical status.
///
/// Records are never mutated once built; the query engine only sets
/// `is_canonical` when it annotates a freshly loaded block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub signed_block: SignedBeaconBlock,
    pub root: Hash,
    pub slot: Slot,
    pub is_canonical: bool,
}

impl BlockRecord {
    /// Build a record by hashing the block message.
    pub fn from_signed(signed_block: SignedBeaconBlock) -> Result<Self, EncodingError> {
        let root = signed_block.block_root()?;
        Ok(Self {
            slot: signed_block.slot(),
            signed_block,
            root,
            is_canonical: false,
        })
    }

    /// Set the canonical flag.
    pub fn with_canonical(mut self, is_canonical: bool) -> Self {
        self.is_canonical = is_canonical;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{BeaconBlock, ForkVersion};

    #[test]
    fn test_record_from_signed() {
        let signed = SignedBeaconBlock::new(
            ForkVersion::Phase0,
            BeaconBlock {
                slot: 12,
                ..Default::default()
            },
        );
        let record = BlockRecord::from_signed(signed.clone()).unwrap();

        assert_eq!(record.slot, 12);
        assert_eq!(record.root, signed.block_root().unwrap());
        assert!(!record.is_canonical);
        assert!(record.with_canonical(true).is_canonical);
    }
}
