//! Causeway Events -- the structured event model the tracker produces.
//!
//! This crate defines everything that crosses the boundary between the
//! interception core and its observers: the attribution data model
//! ([`Cause`](cause::Cause), [`CauseSnapshot`](cause::CauseSnapshot)), the
//! change-transaction payloads, the [`Event`](event::Event) tagged union, and
//! the two host seams -- the [`EventBus`](bus::EventBus) that posts events
//! and reports vetoes, and the [`SpawnPipeline`](spawn::SpawnPipeline) that
//! performs real entity insertion after an event survives.
//!
//! Event payloads are data, not behavior: every variant derives `serde` so
//! hosts can journal posted events verbatim.
//!
//! # Quick Start
//!
//! ```
//! use causeway_events::prelude::*;
//!
//! let mut listeners = ListenerRegistry::new();
//! assert!(!listeners.should_fire(EventCategory::ChangeBlock));
//! listeners.subscribe(EventCategory::ChangeBlock);
//! assert!(listeners.should_fire(EventCategory::ChangeBlock));
//! ```

#![deny(unsafe_code)]

pub mod bus;
pub mod cause;
pub mod event;
pub mod spawn;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::bus::{EventBus, ListenerRegistry, PostOutcome, RecordingBus};
    pub use crate::cause::{Cause, CauseSnapshot, ContextKey, ContextValue, SpawnType};
    pub use crate::event::{
        BlockTransaction, ClickKind, CursorTransaction, Event, EventCategory, SlotTransaction,
    };
    pub use crate::spawn::{CollectingSpawner, SpawnPipeline};
}
