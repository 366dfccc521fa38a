//! The attribution data model: causes, keyed context, and snapshots.
//!
//! A [`Cause`] names one object that contributed to a change -- the player
//! who clicked, the container they clicked in, the block whose tick rule
//! fired. The tracker's cause stack accumulates these while an operation is
//! in flight; when an event is built, the stack is frozen into a
//! [`CauseSnapshot`] that travels with the event.
//!
//! Prefer the most specific variant possible. `Rule` with a bare name is a
//! last resort -- it weakens the attribution chain observers rely on.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use causeway_world::block::{BlockPos, BlockState};
use causeway_world::container::ContainerId;
use causeway_world::entity::{EntityId, PlayerId};
use causeway_world::item::ItemStackSnapshot;

// ---------------------------------------------------------------------------
// Cause
// ---------------------------------------------------------------------------

/// One object in the attribution chain of a change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// A player's direct action.
    Player(PlayerId),
    /// The container an inventory operation ran against.
    Container(ContainerId),
    /// A bare block position (e.g. the target of a scheduled tick).
    Block(BlockPos),
    /// A block position together with the state it held when captured.
    BlockSnapshot(BlockPos, BlockState),
    /// A live entity (e.g. the entity whose tick produced the change).
    Entity(EntityId),
    /// A named game rule -- last resort, prefer an object variant.
    Rule(String),
}

// ---------------------------------------------------------------------------
// Context keys and values
// ---------------------------------------------------------------------------

/// Keys for the cause stack's parallel context map.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKey {
    /// Why entities in a spawn event are appearing.
    SpawnType,
    /// The player considered the creator of affected state.
    Creator,
    /// The player to notify about consequences of the change.
    Notifier,
    /// The item stack used to perform the operation.
    UsedItem,
    /// Host-defined key.
    Custom(String),
}

/// Values stored in the context map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContextValue {
    /// A spawn classification (under [`ContextKey::SpawnType`]).
    SpawnType(SpawnType),
    /// A player reference (creator, notifier).
    Player(PlayerId),
    /// An item snapshot (used item).
    Item(ItemStackSnapshot),
    /// Host-defined payload.
    Json(serde_json::Value),
}

/// Classification of why entities are being spawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnType {
    /// An item stack ejected from an inventory.
    DroppedItem,
    /// A block's own logic producing an entity.
    BlockSpawning,
    /// A deliberate placement (spawn egg, dispenser).
    Placement,
    /// Host-defined spawn reason.
    Custom,
}

// ---------------------------------------------------------------------------
// CauseSnapshot
// ---------------------------------------------------------------------------

/// An immutable snapshot of the cause stack at event-construction time.
///
/// `causes` is in push order; the most recently pushed cause -- the most
/// direct one -- is last. [`CauseSnapshot::root`] and
/// [`CauseSnapshot::direct`] read the two ends.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CauseSnapshot {
    /// The cause sequence, in push order.
    pub causes: Vec<Cause>,
    /// The keyed context visible when the snapshot was taken.
    pub context: HashMap<ContextKey, ContextValue>,
}

impl CauseSnapshot {
    /// An empty snapshot (no attribution available).
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first (outermost) cause, if any.
    pub fn root(&self) -> Option<&Cause> {
        self.causes.first()
    }

    /// The most recently pushed (most direct) cause, if any.
    pub fn direct(&self) -> Option<&Cause> {
        self.causes.last()
    }

    /// The context value under `key`, if present.
    pub fn context(&self, key: &ContextKey) -> Option<&ContextValue> {
        self.context.get(key)
    }

    /// The spawn type recorded in context, if any.
    pub fn spawn_type(&self) -> Option<SpawnType> {
        match self.context.get(&ContextKey::SpawnType) {
            Some(ContextValue::SpawnType(spawn_type)) => Some(*spawn_type),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reads_both_ends() {
        let snapshot = CauseSnapshot {
            causes: vec![
                Cause::Container(ContainerId(1)),
                Cause::Player(PlayerId(2)),
            ],
            context: HashMap::new(),
        };
        assert_eq!(snapshot.root(), Some(&Cause::Container(ContainerId(1))));
        assert_eq!(snapshot.direct(), Some(&Cause::Player(PlayerId(2))));
    }

    #[test]
    fn spawn_type_accessor() {
        let mut snapshot = CauseSnapshot::empty();
        assert_eq!(snapshot.spawn_type(), None);

        snapshot.context.insert(
            ContextKey::SpawnType,
            ContextValue::SpawnType(SpawnType::DroppedItem),
        );
        assert_eq!(snapshot.spawn_type(), Some(SpawnType::DroppedItem));

        // A mistyped value under the key reads as absent, not as a panic.
        snapshot
            .context
            .insert(ContextKey::SpawnType, ContextValue::Player(PlayerId(1)));
        assert_eq!(snapshot.spawn_type(), None);
    }
}
