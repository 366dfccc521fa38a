//! Causeway Tracker -- phase tracking and causal attribution for engine
//! mutation interception.
//!
//! The tracker sits between a voxel engine's raw mutation primitives and its
//! observers. While the engine performs an operation (a scheduled block
//! tick, a network-driven inventory click), the tracker keeps a [`phase`]
//! context on a stack; raw mutations routed through the tracker are buffered
//! into that context instead of silently mutating the world. When the phase
//! ends, [`unwind`] logic converts the buffers into structured events with
//! cause chains from the [`cause`] stack, posts them to the host's event
//! bus, and applies the outcome: commit on allow, revert or discard on veto.
//!
//! Everything is synchronous and single-threaded per simulation instance:
//! one [`PhaseTracker`](tracker::PhaseTracker) per world, no locks, no
//! blocking, no timeouts. Construct it explicitly and pass it explicitly.
//!
//! # Quick Start
//!
//! ```
//! use causeway_events::prelude::*;
//! use causeway_tracker::prelude::*;
//! use causeway_world::prelude::*;
//!
//! let mut world = World::new(true);
//! let mut tracker = PhaseTracker::new();
//! let mut bus = RecordingBus::new(); // nobody listening
//!
//! // Nobody listens, so the mutation takes the direct fast path.
//! let applied = tracker
//!     .intercept_block_change(
//!         &mut world,
//!         &mut bus,
//!         BlockPos::new(0, 64, 0),
//!         BlockState::new(1, 0),
//!         causeway_tracker::flag::masks::DEFAULT,
//!     )
//!     .unwrap();
//! assert!(applied);
//! assert_eq!(bus.post_count(), 0);
//! ```

#![deny(unsafe_code)]

pub mod cause;
pub mod flag;
pub mod phase;
pub mod tracker;
pub mod unwind;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the tracker core.
///
/// The frame/stack variants are programming-invariant violations: they mean
/// a push/pop mismatch in the caller, and the operation that hit them must
/// surface the error rather than continue on corrupted state. Vetoed events
/// are *not* errors -- they come back as ordinary outcomes.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// `pop_phase` was called with no phase active.
    #[error("phase stack underflow: pop with no active phase")]
    PhaseStackUnderflow,

    /// A cause frame was released while no frame was open.
    #[error("cause frame {released} released with no frame open")]
    CauseFrameUnderflow {
        released: u64,
    },

    /// A cause frame was released out of order.
    #[error("cause frame released out of order: innermost open frame is {open}, released {released}")]
    CauseFrameMismatch {
        open: u64,
        released: u64,
    },

    /// A world-model lookup failed during interception or unwind.
    #[error(transparent)]
    World(#[from] causeway_world::WorldError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::cause::{CauseStack, FrameHandle};
    pub use crate::flag::{masks, ChangeFlag, ChangeFlagRegistry};
    pub use crate::phase::{BlockChangeRecord, CaptureBuffers, PhaseContext, PhaseData, PhaseKind};
    pub use crate::tracker::PhaseTracker;
    pub use crate::unwind::UnwindOutcome;
    pub use crate::TrackerError;
}

// ---------------------------------------------------------------------------
// Integration Tests
// ---------------------------------------------------------------------------
