//! Structured change events and their transaction payloads.
//!
//! Every event carries old-and-new value pairs (transactions) plus the
//! [`CauseSnapshot`] explaining why the change happened. Transactions are
//! immutable once captured: reverting a vetoed event means re-applying the
//! `original` side, committing means applying the `proposed` side.

use serde::{Deserialize, Serialize};

use causeway_world::block::{BlockPos, BlockState};
use causeway_world::container::SlotRef;
use causeway_world::entity::EntityCandidate;
use causeway_world::item::ItemStackSnapshot;

use crate::cause::CauseSnapshot;

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

/// A captured block change: what was there, what wants to be there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockTransaction {
    /// The affected position.
    pub pos: BlockPos,
    /// The state before the change.
    pub original: BlockState,
    /// The state the engine proposed.
    pub proposed: BlockState,
}

/// A captured inventory slot change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotTransaction {
    /// The affected slot.
    pub slot: SlotRef,
    /// Slot contents before the operation.
    pub original: ItemStackSnapshot,
    /// Slot contents the operation proposed.
    pub proposed: ItemStackSnapshot,
}

/// A captured change to the item on the player's cursor.
///
/// The cursor is not a container slot, so it gets its own transaction kind;
/// it reverts and commits exactly like a slot transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CursorTransaction {
    /// Cursor contents before the operation.
    pub original: ItemStackSnapshot,
    /// Cursor contents the operation proposed.
    pub proposed: ItemStackSnapshot,
}

// ---------------------------------------------------------------------------
// ClickKind
// ---------------------------------------------------------------------------

/// The sub-kind of an inventory click, carried from the originating packet.
///
/// Unwind logic never re-derives this from captured state -- the packet that
/// started the phase said what kind of click it was, and that is what the
/// resulting event reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClickKind {
    /// Plain left/right click on a slot.
    Primary,
    /// Drop one item or a whole stack out of the inventory.
    Drop,
    /// Paint-drag across several slots.
    Drag,
    /// Shift-click quick-move.
    Shift,
    /// Hotbar number-key swap.
    NumberKey,
    /// Enchantment-table button press.
    Enchant,
}

// ---------------------------------------------------------------------------
// EventCategory
// ---------------------------------------------------------------------------

/// Coarse event categories, used for the hot-path listener check.
///
/// The tracker asks [`should_fire`](crate::bus::EventBus::should_fire) with a
/// category before doing any interception work; a category with no listeners
/// costs one branch and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    /// Pre-change gate for block mutations.
    ChangeBlockPre,
    /// Post-capture block change transactions.
    ChangeBlock,
    /// Inventory click resolution.
    ClickContainer,
    /// Entity spawn resolution.
    SpawnEntity,
}

impl EventCategory {
    /// All categories, in declaration order.
    pub const ALL: [EventCategory; 4] = [
        EventCategory::ChangeBlockPre,
        EventCategory::ChangeBlock,
        EventCategory::ClickContainer,
        EventCategory::SpawnEntity,
    ];

    /// Dense index for per-category tables.
    pub(crate) fn index(self) -> usize {
        match self {
            EventCategory::ChangeBlockPre => 0,
            EventCategory::ChangeBlock => 1,
            EventCategory::ClickContainer => 2,
            EventCategory::SpawnEntity => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A structured, cancellable change event.
///
/// Variants are the classification outcomes of phase unwinds (plus the
/// pre-change gate). Every variant carries the cause snapshot taken at
/// construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// Proposed block changes, posted *before* any state is touched.
    ChangeBlockPre {
        /// The positions that would change.
        positions: Vec<BlockPos>,
        /// The states proposed for those positions, index-parallel.
        proposed: Vec<BlockState>,
        /// Attribution at proposal time.
        cause: CauseSnapshot,
    },
    /// Captured block changes, posted at phase unwind.
    ChangeBlock {
        /// One transaction per captured change, in capture order.
        transactions: Vec<BlockTransaction>,
        /// Attribution at unwind time.
        cause: CauseSnapshot,
    },
    /// An inventory click resolved at phase unwind.
    ClickContainer {
        /// The click sub-kind, carried from the originating packet.
        kind: ClickKind,
        /// The cursor change, if the cursor was touched.
        cursor: Option<CursorTransaction>,
        /// Captured slot transactions, in capture order.
        transactions: Vec<SlotTransaction>,
        /// Entities this click proposes to spawn (drops, thrown items).
        entities: Vec<EntityCandidate>,
        /// Attribution at unwind time.
        cause: CauseSnapshot,
    },
    /// Entities proposed for insertion into live state.
    SpawnEntity {
        /// The spawn candidates.
        entities: Vec<EntityCandidate>,
        /// Attribution at unwind time.
        cause: CauseSnapshot,
    },
}

impl Event {
    /// The category used for listener checks on this event.
    pub fn category(&self) -> EventCategory {
        match self {
            Event::ChangeBlockPre { .. } => EventCategory::ChangeBlockPre,
            Event::ChangeBlock { .. } => EventCategory::ChangeBlock,
            Event::ClickContainer { .. } => EventCategory::ClickContainer,
            Event::SpawnEntity { .. } => EventCategory::SpawnEntity,
        }
    }

    /// The cause snapshot carried by this event.
    pub fn cause(&self) -> &CauseSnapshot {
        match self {
            Event::ChangeBlockPre { cause, .. }
            | Event::ChangeBlock { cause, .. }
            | Event::ClickContainer { cause, .. }
            | Event::SpawnEntity { cause, .. } => cause,
        }
    }
}
