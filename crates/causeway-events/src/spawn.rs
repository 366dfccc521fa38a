//! The spawn pipeline seam.
//!
//! The tracker never inserts entities into live state itself. Candidates
//! that survive their event are handed to the host's [`SpawnPipeline`]
//! together with the cause snapshot, so the host can record spawn
//! attribution (creator, notifier, spawn type) in its own structures.

use tracing::debug;

use causeway_world::entity::EntityCandidate;
use causeway_world::world::World;

use crate::cause::CauseSnapshot;

// ---------------------------------------------------------------------------
// SpawnPipeline
// ---------------------------------------------------------------------------

/// The host's entity-insertion seam. Invoked only post-event, only when the
/// event was not cancelled.
pub trait SpawnPipeline {
    /// Insert `entities` into `world`, recording `cause` as their spawn
    /// attribution. Returns how many were actually inserted (hosts may
    /// still reject individual candidates, e.g. for despawned dimensions).
    fn spawn_all(
        &mut self,
        world: &mut World,
        entities: Vec<EntityCandidate>,
        cause: &CauseSnapshot,
    ) -> usize;
}

// ---------------------------------------------------------------------------
// CollectingSpawner
// ---------------------------------------------------------------------------

/// A pipeline for tests and host bring-up: inserts every candidate and
/// remembers the cause snapshot each batch arrived with.
#[derive(Debug, Default)]
pub struct CollectingSpawner {
    batches: Vec<(usize, CauseSnapshot)>,
}

impl CollectingSpawner {
    /// A new, empty spawner.
    pub fn new() -> Self {
        Self::default()
    }

    /// The `(batch_size, cause)` pairs seen so far, in arrival order.
    pub fn batches(&self) -> &[(usize, CauseSnapshot)] {
        &self.batches
    }

    /// Total entities spawned across all batches.
    pub fn spawned_count(&self) -> usize {
        self.batches.iter().map(|(count, _)| count).sum()
    }
}

impl SpawnPipeline for CollectingSpawner {
    fn spawn_all(
        &mut self,
        world: &mut World,
        entities: Vec<EntityCandidate>,
        cause: &CauseSnapshot,
    ) -> usize {
        let count = entities.len();
        debug!(count, "spawning entities post-event");
        for candidate in entities {
            world.insert_entity(candidate);
        }
        self.batches.push((count, cause.clone()));
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_world::block::BlockPos;
    use causeway_world::entity::EntityId;

    #[test]
    fn collecting_spawner_inserts_and_records() {
        let mut world = World::new(true);
        let mut spawner = CollectingSpawner::new();

        let entities = vec![
            EntityCandidate::new(EntityId(1), "item", BlockPos::new(0, 0, 0)),
            EntityCandidate::new(EntityId(2), "item", BlockPos::new(0, 1, 0)),
        ];
        let inserted = spawner.spawn_all(&mut world, entities, &CauseSnapshot::empty());

        assert_eq!(inserted, 2);
        assert_eq!(world.entity_count(), 2);
        assert!(world.has_entity(EntityId(1)));
        assert_eq!(spawner.spawned_count(), 2);
        assert_eq!(spawner.batches().len(), 1);
    }
}
