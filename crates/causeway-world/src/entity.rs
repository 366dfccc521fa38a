//! Entity identifiers and spawn candidates.
//!
//! The tracker never owns live entities -- it only buffers *candidates*:
//! entities the engine proposed to spawn during a phase, held back until the
//! resulting event resolves. A candidate that survives the event is handed to
//! the host's spawn pipeline; a vetoed candidate is simply dropped, leaving
//! no trace in live state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::block::BlockPos;

// ---------------------------------------------------------------------------
// Ids
// ---------------------------------------------------------------------------

/// Identifier the host engine assigned to a (proposed or live) entity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

/// Identifier for a connected player.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub u64);

impl fmt::Debug for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// EntityCandidate
// ---------------------------------------------------------------------------

/// A proposed-but-not-yet-inserted entity.
///
/// Carries just enough identity for event consumers to decide its fate and
/// for the spawn pipeline to perform the real insertion afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityCandidate {
    /// The id the engine pre-assigned to this entity.
    pub id: EntityId,
    /// Host-defined entity kind (e.g. `"item"`, `"experience_orb"`).
    pub kind: String,
    /// Where the entity would appear.
    pub pos: BlockPos,
}

impl EntityCandidate {
    /// Construct a candidate.
    pub fn new(id: EntityId, kind: impl Into<String>, pos: BlockPos) -> Self {
        Self {
            id,
            kind: kind.into(),
            pos,
        }
    }
}
