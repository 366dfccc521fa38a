//! Phase kinds, phase data, and the per-phase capture buffers.
//!
//! A *phase* is one in-flight logical operation the engine is performing --
//! a scheduled block tick, a network-driven inventory click. While a phase
//! is active, raw mutations are diverted into its capture buffers instead of
//! becoming events immediately; the buffers are drained exactly once when
//! the phase unwinds.
//!
//! [`PhaseData`] is a tagged union: each kind of phase carries exactly the
//! operation metadata it needs, captured at push time. There is no way to
//! build an inventory-click phase without its container, so unwind logic
//! never has to second-guess its own inputs.

use serde::Serialize;

use causeway_events::event::{ClickKind, CursorTransaction, SlotTransaction};
use causeway_world::block::{BlockPos, BlockState};
use causeway_world::container::ContainerId;
use causeway_world::entity::{EntityCandidate, EntityId, PlayerId};

use crate::flag::ChangeFlag;

// ---------------------------------------------------------------------------
// PhaseKind
// ---------------------------------------------------------------------------

/// The variant tag of a phase, used for dispatch and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PhaseKind {
    /// A scheduled or random block tick.
    BlockTick,
    /// One entity's per-tick update.
    EntityTick,
    /// A player breaking a block.
    BlockBreak,
    /// A player placing a block.
    BlockPlace,
    /// A network-driven inventory click, with its sub-kind.
    InventoryClick(ClickKind),
}

// ---------------------------------------------------------------------------
// PhaseData
// ---------------------------------------------------------------------------

/// Operation metadata captured when a phase is pushed.
#[derive(Debug, Clone, Serialize)]
pub enum PhaseData {
    /// A scheduled or random tick of the block at `pos`.
    BlockTick {
        /// The ticked position.
        pos: BlockPos,
        /// The rule that scheduled the tick, when the engine knows it.
        rule: Option<String>,
    },
    /// One entity's per-tick update.
    EntityTick {
        /// The ticking entity.
        entity: EntityId,
    },
    /// `player` breaking the block at `pos`.
    BlockBreak {
        /// The acting player.
        player: PlayerId,
        /// The broken position.
        pos: BlockPos,
    },
    /// `player` placing a block at `pos`.
    BlockPlace {
        /// The acting player.
        player: PlayerId,
        /// The placed-into position.
        pos: BlockPos,
    },
    /// A network-driven click in an open container.
    InventoryClick {
        /// The click sub-kind, carried from the originating packet.
        click: ClickKind,
        /// The clicking player.
        player: PlayerId,
        /// The open container the click ran against.
        container: ContainerId,
        /// The cursor change proposed by the click, if the cursor moved.
        cursor: Option<CursorTransaction>,
    },
}

impl PhaseData {
    /// The variant tag for this phase.
    pub fn kind(&self) -> PhaseKind {
        match self {
            PhaseData::BlockTick { .. } => PhaseKind::BlockTick,
            PhaseData::EntityTick { .. } => PhaseKind::EntityTick,
            PhaseData::BlockBreak { .. } => PhaseKind::BlockBreak,
            PhaseData::BlockPlace { .. } => PhaseKind::BlockPlace,
            PhaseData::InventoryClick { click, .. } => PhaseKind::InventoryClick(*click),
        }
    }

    /// The acting player, for phases that have one.
    pub fn player(&self) -> Option<PlayerId> {
        match self {
            PhaseData::BlockBreak { player, .. }
            | PhaseData::BlockPlace { player, .. }
            | PhaseData::InventoryClick { player, .. } => Some(*player),
            PhaseData::BlockTick { .. } | PhaseData::EntityTick { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// BlockChangeRecord
// ---------------------------------------------------------------------------

/// A raw captured block change, flag included.
///
/// The flag is registry-interned and therefore serialize-only; events strip
/// it down to a plain transaction before leaving the tracker.
#[derive(Debug, Clone, Serialize)]
pub struct BlockChangeRecord {
    /// The affected position.
    pub pos: BlockPos,
    /// The state before the change.
    pub original: BlockState,
    /// The state the engine proposed (and, pre-veto, applied).
    pub proposed: BlockState,
    /// The side-effect flag the mutation was requested with.
    pub flag: ChangeFlag,
}

// ---------------------------------------------------------------------------
// PhaseContext
// ---------------------------------------------------------------------------

/// One in-flight phase: its metadata plus exclusively-owned capture buffers.
///
/// Buffers are moved out (not copied) exactly once, by the unwind that
/// consumes the context.
#[derive(Debug)]
pub struct PhaseContext {
    data: PhaseData,
    captured_entities: Vec<EntityCandidate>,
    slot_transactions: Vec<SlotTransaction>,
    block_changes: Vec<BlockChangeRecord>,
}

/// The capture buffers of a phase, drained at unwind.
#[derive(Debug, Default)]
pub struct CaptureBuffers {
    /// Entities proposed for spawning during the phase.
    pub entities: Vec<EntityCandidate>,
    /// Slot transactions observed during the phase.
    pub slots: Vec<SlotTransaction>,
    /// Block changes applied (pre-veto) during the phase.
    pub blocks: Vec<BlockChangeRecord>,
}

impl PhaseContext {
    /// Create a context with empty buffers.
    pub fn new(data: PhaseData) -> Self {
        Self {
            data,
            captured_entities: Vec::new(),
            slot_transactions: Vec::new(),
            block_changes: Vec::new(),
        }
    }

    /// The phase's variant tag.
    pub fn kind(&self) -> PhaseKind {
        self.data.kind()
    }

    /// The phase's push-time metadata.
    pub fn data(&self) -> &PhaseData {
        &self.data
    }

    /// Buffer a proposed entity spawn.
    pub fn capture_entity(&mut self, candidate: EntityCandidate) {
        self.captured_entities.push(candidate);
    }

    /// Buffer an observed slot transaction.
    pub fn capture_slot_transaction(&mut self, transaction: SlotTransaction) {
        self.slot_transactions.push(transaction);
    }

    /// Buffer an applied block change.
    pub fn capture_block_change(&mut self, record: BlockChangeRecord) {
        self.block_changes.push(record);
    }

    /// Whether every capture buffer is empty.
    pub fn buffers_empty(&self) -> bool {
        self.captured_entities.is_empty()
            && self.slot_transactions.is_empty()
            && self.block_changes.is_empty()
    }

    /// Captured entities so far.
    pub fn captured_entities(&self) -> &[EntityCandidate] {
        &self.captured_entities
    }

    /// Captured slot transactions so far.
    pub fn slot_transactions(&self) -> &[SlotTransaction] {
        &self.slot_transactions
    }

    /// Captured block changes so far.
    pub fn block_changes(&self) -> &[BlockChangeRecord] {
        &self.block_changes
    }

    /// Move every buffer out, leaving the context empty. Called exactly once
    /// per context, by its unwind.
    pub(crate) fn drain_buffers(&mut self) -> CaptureBuffers {
        CaptureBuffers {
            entities: std::mem::take(&mut self.captured_entities),
            slots: std::mem::take(&mut self.slot_transactions),
            blocks: std::mem::take(&mut self.block_changes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_world::item::{ItemId, ItemStackSnapshot};

    #[test]
    fn kind_reflects_data() {
        let click = PhaseData::InventoryClick {
            click: ClickKind::Drop,
            player: PlayerId(1),
            container: ContainerId(2),
            cursor: None,
        };
        assert_eq!(click.kind(), PhaseKind::InventoryClick(ClickKind::Drop));
        assert_eq!(click.player(), Some(PlayerId(1)));

        let tick = PhaseData::BlockTick {
            pos: BlockPos::new(0, 0, 0),
            rule: None,
        };
        assert_eq!(tick.kind(), PhaseKind::BlockTick);
        assert_eq!(tick.player(), None);
    }

    #[test]
    fn drain_empties_all_buffers() {
        let mut context = PhaseContext::new(PhaseData::BlockTick {
            pos: BlockPos::new(0, 0, 0),
            rule: None,
        });
        context.capture_entity(EntityCandidate::new(
            EntityId(1),
            "item",
            BlockPos::new(0, 1, 0),
        ));
        context.capture_slot_transaction(SlotTransaction {
            slot: causeway_world::container::SlotRef::new(ContainerId(1), 0),
            original: ItemStackSnapshot::EMPTY,
            proposed: ItemStackSnapshot::new(ItemId(1), 1),
        });
        assert!(!context.buffers_empty());

        let buffers = context.drain_buffers();
        assert_eq!(buffers.entities.len(), 1);
        assert_eq!(buffers.slots.len(), 1);
        assert!(buffers.blocks.is_empty());
        assert!(context.buffers_empty());
    }
}
