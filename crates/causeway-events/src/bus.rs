//! The event bus seam and the hot-path listener registry.
//!
//! The tracker treats the bus as an opaque synchronous callback: post an
//! event, get back allowed-or-cancelled. [`ListenerRegistry`] backs the
//! `should_fire` fast path -- per-category listener counts updated when
//! observers register or unregister, checked on every intercepted mutation
//! so that a category nobody listens to costs one branch and zero
//! allocation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{Event, EventCategory};

// ---------------------------------------------------------------------------
// PostOutcome
// ---------------------------------------------------------------------------

/// The resolution of a posted event.
///
/// A veto is a first-class control outcome, not an error: the caller decides
/// what "not applied" means for its operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostOutcome {
    /// No observer objected; the change proceeds.
    Allowed,
    /// An observer vetoed; buffered state must be discarded or reverted.
    Cancelled,
}

impl PostOutcome {
    /// Whether the event was cancelled.
    pub fn is_cancelled(self) -> bool {
        matches!(self, PostOutcome::Cancelled)
    }
}

// ---------------------------------------------------------------------------
// ListenerRegistry
// ---------------------------------------------------------------------------

/// Per-category listener counts for the `should_fire` fast path.
///
/// Rarely changing: updated only when observers (un)register, read on every
/// intercepted mutation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListenerRegistry {
    counts: [u32; EventCategory::ALL.len()],
}

impl ListenerRegistry {
    /// Create a registry with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one more listener for `category`.
    pub fn subscribe(&mut self, category: EventCategory) {
        self.counts[category.index()] += 1;
    }

    /// Record one fewer listener for `category`. Saturates at zero.
    pub fn unsubscribe(&mut self, category: EventCategory) {
        let count = &mut self.counts[category.index()];
        *count = count.saturating_sub(1);
    }

    /// Whether any listener is registered for `category`.
    pub fn should_fire(&self, category: EventCategory) -> bool {
        self.counts[category.index()] > 0
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// The host's event dispatch seam.
///
/// `post` is synchronous and may run arbitrary observer code; the tracker
/// guarantees its own cleanup (buffers, cause frames) regardless of what the
/// observers do with the event.
pub trait EventBus {
    /// Whether any observer is registered for `category`. Checked on the hot
    /// path before any interception work happens.
    fn should_fire(&self, category: EventCategory) -> bool;

    /// Deliver `event` to observers and report the resolution.
    fn post(&mut self, event: &Event) -> PostOutcome;
}

// ---------------------------------------------------------------------------
// RecordingBus
// ---------------------------------------------------------------------------

/// A scriptable bus for tests and host bring-up.
///
/// Records every posted event and answers each post with the next scripted
/// outcome (defaulting to [`PostOutcome::Allowed`] when the script runs dry).
#[derive(Debug, Default)]
pub struct RecordingBus {
    listeners: ListenerRegistry,
    posted: Vec<Event>,
    script: Vec<PostOutcome>,
}

impl RecordingBus {
    /// A bus with no listeners and an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus already subscribed to every category.
    pub fn listening_to_all() -> Self {
        let mut bus = Self::new();
        for category in EventCategory::ALL {
            bus.listeners.subscribe(category);
        }
        bus
    }

    /// Mutable access to the listener registry.
    pub fn listeners_mut(&mut self) -> &mut ListenerRegistry {
        &mut self.listeners
    }

    /// Queue `outcome` as the answer to the next un-scripted post.
    /// Outcomes are consumed in FIFO order.
    pub fn script_outcome(&mut self, outcome: PostOutcome) {
        self.script.push(outcome);
    }

    /// Every event posted so far, in post order.
    pub fn posted(&self) -> &[Event] {
        &self.posted
    }

    /// Number of posted events.
    pub fn post_count(&self) -> usize {
        self.posted.len()
    }
}

impl EventBus for RecordingBus {
    fn should_fire(&self, category: EventCategory) -> bool {
        self.listeners.should_fire(category)
    }

    fn post(&mut self, event: &Event) -> PostOutcome {
        let outcome = if self.script.is_empty() {
            PostOutcome::Allowed
        } else {
            self.script.remove(0)
        };
        debug!(category = ?event.category(), ?outcome, "event posted");
        self.posted.push(event.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::CauseSnapshot;

    #[test]
    fn registry_counts_listeners() {
        let mut registry = ListenerRegistry::new();
        assert!(!registry.should_fire(EventCategory::ChangeBlock));

        registry.subscribe(EventCategory::ChangeBlock);
        registry.subscribe(EventCategory::ChangeBlock);
        assert!(registry.should_fire(EventCategory::ChangeBlock));
        // Other categories are unaffected.
        assert!(!registry.should_fire(EventCategory::SpawnEntity));

        registry.unsubscribe(EventCategory::ChangeBlock);
        assert!(registry.should_fire(EventCategory::ChangeBlock));
        registry.unsubscribe(EventCategory::ChangeBlock);
        assert!(!registry.should_fire(EventCategory::ChangeBlock));
    }

    #[test]
    fn unsubscribe_saturates_at_zero() {
        let mut registry = ListenerRegistry::new();
        registry.unsubscribe(EventCategory::ChangeBlock);
        assert!(!registry.should_fire(EventCategory::ChangeBlock));
    }

    #[test]
    fn recording_bus_scripts_outcomes_fifo() {
        let mut bus = RecordingBus::listening_to_all();
        bus.script_outcome(PostOutcome::Cancelled);

        let event = Event::SpawnEntity {
            entities: Vec::new(),
            cause: CauseSnapshot::empty(),
        };
        assert_eq!(bus.post(&event), PostOutcome::Cancelled);
        // Script exhausted: defaults to allowed.
        assert_eq!(bus.post(&event), PostOutcome::Allowed);
        assert_eq!(bus.post_count(), 2);
    }
}
