//! Causeway World -- the minimal engine object model the tracker consumes.
//!
//! This crate models the host engine's world just deeply enough for the
//! interception core to buffer, apply, and revert mutations: block positions
//! and states, immutable item-stack snapshots, containers with slots, entity
//! spawn candidates, and the live authoritative [`World`] state.
//!
//! The real host engine's object model is far richer; everything here is the
//! narrow waist the tracker actually touches. Value types derive `serde` so
//! captured transactions and posted events stay journal-able by host tooling.
//!
//! # Quick Start
//!
//! ```
//! use causeway_world::prelude::*;
//!
//! let mut world = World::new(true);
//! let pos = BlockPos::new(0, 64, 0);
//! world.set_block_raw(pos, BlockState::new(1, 0));
//! assert_eq!(world.block_at(pos), BlockState::new(1, 0));
//! ```

#![deny(unsafe_code)]

pub mod block;
pub mod container;
pub mod entity;
pub mod item;
pub mod world;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by world-model operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The container id does not name a registered container.
    #[error("container {container:?} is not registered in this world")]
    UnknownContainer {
        container: container::ContainerId,
    },

    /// A slot index is out of range for its container.
    #[error("slot {index} out of range for container {container:?} ({len} slots)")]
    SlotOutOfRange {
        container: container::ContainerId,
        index: usize,
        len: usize,
    },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::block::{BlockPos, BlockState};
    pub use crate::container::{Container, ContainerId, SlotRef};
    pub use crate::entity::{EntityCandidate, EntityId, PlayerId};
    pub use crate::item::{ItemId, ItemStackSnapshot};
    pub use crate::world::World;
    pub use crate::WorldError;
}
