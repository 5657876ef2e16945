//! Slot and epoch arithmetic.

use crate::error::SlotError;
use shared_types::{Epoch, Slot};

/// Epoch containing `slot`.
pub fn to_epoch(slot: Slot, slots_per_epoch: u64) -> Result<Epoch, SlotError> {
    if slots_per_epoch == 0 {
        return Err(SlotError::ZeroSlotsPerEpoch);
    }
    Ok(slot / slots_per_epoch)
}

/// First slot of `epoch`.
pub fn epoch_start(epoch: Epoch, slots_per_epoch: u64) -> Result<Slot, SlotError> {
    if slots_per_epoch == 0 {
        return Err(SlotError::ZeroSlotsPerEpoch);
    }
    epoch
        .checked_mul(slots_per_epoch)
        .ok_or(SlotError::Overflow {
            epoch,
            slots_per_epoch,
        })
}

/// Last slot of `epoch`.
pub fn epoch_end(epoch: Epoch, slots_per_epoch: u64) -> Result<Slot, SlotError> {
    let start = epoch_start(epoch, slots_per_epoch)?;
    start
        .checked_add(slots_per_epoch - 1)
        .ok_or(SlotError::Overflow {
            epoch,
            slots_per_epoch,
        })
}
