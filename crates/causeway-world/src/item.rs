//! Immutable item-stack snapshots.
//!
//! A [`ItemStackSnapshot`] is a point-in-time copy of an inventory slot's
//! contents. Captured transactions hold two of these (original and proposed);
//! because snapshots are immutable values, reverting a vetoed transaction is
//! just writing the original snapshot back.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// The host engine's numeric item-kind identifier. 0 is "no item".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

// ---------------------------------------------------------------------------
// ItemStackSnapshot
// ---------------------------------------------------------------------------

/// An immutable snapshot of a stack of items.
///
/// An empty slot is represented by [`ItemStackSnapshot::EMPTY`] (item 0,
/// count 0), never by an `Option` -- this mirrors how the host engine's slot
/// array works and keeps transaction revert a plain write.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemStackSnapshot {
    /// The item kind, or `ItemId(0)` for an empty slot.
    pub item: ItemId,
    /// Number of items in the stack.
    pub count: u32,
}

impl ItemStackSnapshot {
    /// The empty-slot snapshot.
    pub const EMPTY: ItemStackSnapshot = ItemStackSnapshot {
        item: ItemId(0),
        count: 0,
    };

    /// Construct a snapshot of `count` items of kind `item`.
    #[inline]
    pub fn new(item: ItemId, count: u32) -> Self {
        Self { item, count }
    }

    /// Whether this snapshot represents an empty slot.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.item.0 == 0 || self.count == 0
    }
}

impl Default for ItemStackSnapshot {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for ItemStackSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "ItemStackSnapshot(empty)")
        } else {
            write!(f, "ItemStackSnapshot({}x{})", self.count, self.item.0)
        }
    }
}
