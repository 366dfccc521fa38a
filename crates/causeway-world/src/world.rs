//! The live, authoritative world state.
//!
//! [`World`] is the substrate the tracker applies or reverts mutations
//! against: a sparse block map, the set of registered containers, and the
//! entities that have actually been inserted. The `authoritative` flag marks
//! whether this instance is the server-side simulated timeline -- client-side
//! preview worlds are non-authoritative and the tracker applies mutations to
//! them directly, without interception.
//!
//! Every simulation instance owns exactly one `World` and exactly one
//! tracker; nothing here carries locks.

use std::collections::HashMap;

use tracing::debug;

use crate::block::{BlockPos, BlockState};
use crate::container::{Container, ContainerId, SlotRef};
use crate::entity::{EntityCandidate, EntityId, PlayerId};
use crate::item::ItemStackSnapshot;
use crate::WorldError;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Live engine state for one simulation instance.
#[derive(Debug, Default)]
pub struct World {
    /// Whether this is the authoritative server-side timeline.
    authoritative: bool,
    /// Sparse block storage; positions absent from the map are air.
    blocks: HashMap<BlockPos, BlockState>,
    /// Registered containers by id.
    containers: HashMap<ContainerId, Container>,
    /// The item stack each player is holding on their cursor.
    cursors: HashMap<PlayerId, ItemStackSnapshot>,
    /// Entities that have actually been inserted into live state.
    entities: Vec<EntityCandidate>,
}

impl World {
    /// Create an empty world. `authoritative` marks the server timeline.
    pub fn new(authoritative: bool) -> Self {
        Self {
            authoritative,
            blocks: HashMap::new(),
            containers: HashMap::new(),
            cursors: HashMap::new(),
            entities: Vec::new(),
        }
    }

    /// Whether this world is the authoritative simulated timeline.
    pub fn is_authoritative(&self) -> bool {
        self.authoritative
    }

    // -- blocks -------------------------------------------------------------

    /// The state at `pos` (air if never written).
    pub fn block_at(&self, pos: BlockPos) -> BlockState {
        self.blocks.get(&pos).copied().unwrap_or(BlockState::AIR)
    }

    /// Raw state write, bypassing all interception. Returns the previous
    /// state. This is the primitive the tracker redirects; host code should
    /// never call it while an interceptable operation is in flight.
    pub fn set_block_raw(&mut self, pos: BlockPos, state: BlockState) -> BlockState {
        debug!(%pos, ?state, "raw block write");
        if state.is_air() {
            self.blocks.remove(&pos).unwrap_or(BlockState::AIR)
        } else {
            self.blocks.insert(pos, state).unwrap_or(BlockState::AIR)
        }
    }

    // -- containers ---------------------------------------------------------

    /// Register a container. Replaces any previous container with the same id.
    pub fn add_container(&mut self, container: Container) {
        self.containers.insert(container.id, container);
    }

    /// Shared access to a container.
    pub fn container(&self, id: ContainerId) -> Result<&Container, WorldError> {
        self.containers
            .get(&id)
            .ok_or(WorldError::UnknownContainer { container: id })
    }

    /// Mutable access to a container.
    pub fn container_mut(&mut self, id: ContainerId) -> Result<&mut Container, WorldError> {
        self.containers
            .get_mut(&id)
            .ok_or(WorldError::UnknownContainer { container: id })
    }

    /// Snapshot of the slot behind `slot_ref`.
    pub fn slot(&self, slot_ref: SlotRef) -> Result<ItemStackSnapshot, WorldError> {
        let container = self.container(slot_ref.container)?;
        container
            .slot(slot_ref.index)
            .ok_or(WorldError::SlotOutOfRange {
                container: slot_ref.container,
                index: slot_ref.index,
                len: container.slot_count(),
            })
    }

    /// Overwrite the slot behind `slot_ref` with `stack`.
    pub fn apply_to_slot(
        &mut self,
        slot_ref: SlotRef,
        stack: ItemStackSnapshot,
    ) -> Result<(), WorldError> {
        let container = self.container_mut(slot_ref.container)?;
        let len = container.slot_count();
        if container.set_slot(slot_ref.index, stack) {
            Ok(())
        } else {
            Err(WorldError::SlotOutOfRange {
                container: slot_ref.container,
                index: slot_ref.index,
                len,
            })
        }
    }

    // -- cursors ------------------------------------------------------------

    /// The stack on `player`'s cursor (empty if never set).
    pub fn cursor(&self, player: PlayerId) -> ItemStackSnapshot {
        self.cursors
            .get(&player)
            .copied()
            .unwrap_or(ItemStackSnapshot::EMPTY)
    }

    /// Overwrite the stack on `player`'s cursor.
    pub fn set_cursor(&mut self, player: PlayerId, stack: ItemStackSnapshot) {
        if stack.is_empty() {
            self.cursors.remove(&player);
        } else {
            self.cursors.insert(player, stack);
        }
    }

    // -- entities -----------------------------------------------------------

    /// Insert an entity into live state. The tracker only calls this through
    /// the spawn pipeline, after event resolution.
    pub fn insert_entity(&mut self, candidate: EntityCandidate) {
        debug!(id = ?candidate.id, kind = %candidate.kind, "entity inserted");
        self.entities.push(candidate);
    }

    /// Whether an entity with `id` has been inserted into live state.
    pub fn has_entity(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Number of non-air block positions.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}
