//! Containers: the open-inventory surface the tracker captures against.
//!
//! A [`Container`] is a flat array of item slots plus the `capturing` flag
//! the interception layer toggles while an inventory operation is in flight.
//! Customized host containers are known to clear the flag out from under the
//! tracker (they override the change-detection pass entirely); the unwind
//! logic treats that as third-party interference and discards its buffered
//! transactions rather than firing events for state it no longer trusts.

use serde::{Deserialize, Serialize};

use crate::item::ItemStackSnapshot;

// ---------------------------------------------------------------------------
// ContainerId / SlotRef
// ---------------------------------------------------------------------------

/// Identifier for a container registered in a [`World`](crate::world::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerId(pub u32);

/// A reference to one slot of one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// The owning container.
    pub container: ContainerId,
    /// Index into the container's slot array.
    pub index: usize,
}

impl SlotRef {
    /// Construct a slot reference.
    #[inline]
    pub fn new(container: ContainerId, index: usize) -> Self {
        Self { container, index }
    }
}

// ---------------------------------------------------------------------------
// Container
// ---------------------------------------------------------------------------

/// A live container: slot contents plus the capture flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// This container's id.
    pub id: ContainerId,
    /// Current slot contents.
    slots: Vec<ItemStackSnapshot>,
    /// Whether the interception layer is currently capturing slot changes
    /// on this container.
    capturing: bool,
}

impl Container {
    /// Create a container with `slot_count` empty slots.
    pub fn new(id: ContainerId, slot_count: usize) -> Self {
        Self {
            id,
            slots: vec![ItemStackSnapshot::EMPTY; slot_count],
            capturing: false,
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Snapshot of the slot at `index`, or `None` if out of range.
    pub fn slot(&self, index: usize) -> Option<ItemStackSnapshot> {
        self.slots.get(index).copied()
    }

    /// Overwrite the slot at `index`. Returns `false` if out of range.
    pub fn set_slot(&mut self, index: usize, stack: ItemStackSnapshot) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = stack;
                true
            }
            None => false,
        }
    }

    /// Whether the interception layer is capturing changes on this container.
    pub fn capturing(&self) -> bool {
        self.capturing
    }

    /// Set the capture flag.
    pub fn set_capturing(&mut self, capturing: bool) {
        self.capturing = capturing;
    }
}
