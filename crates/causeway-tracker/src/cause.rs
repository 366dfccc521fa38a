//! The cause stack: ordered attribution plus keyed context, scoped by frames.
//!
//! While an operation is in flight, the tracker pushes the objects that
//! explain it -- the block whose rule fired, the player who clicked -- onto
//! the [`CauseStack`], and records keyed context (spawn type, notifier)
//! alongside. Event construction freezes the stack into a
//! [`CauseSnapshot`] that travels with the event.
//!
//! Frames give snapshot isolation: a [`FrameHandle`] checkpoints the cause
//! list and context map at push time, and releasing the frame restores both
//! exactly -- whatever was pushed or overwritten inside the frame vanishes.
//! Frames strictly nest. Releasing a frame that is not the innermost open
//! one is a push/pop mismatch in the caller; the stack reports it loudly and
//! leaves its state untouched so the bug is visible rather than papered
//! over.

use std::collections::HashMap;

use tracing::trace;

use causeway_events::cause::{Cause, CauseSnapshot, ContextKey, ContextValue};

use crate::TrackerError;

// ---------------------------------------------------------------------------
// FrameHandle
// ---------------------------------------------------------------------------

/// A checkpoint token for one open cause frame.
///
/// Deliberately neither `Copy` nor `Clone`: the handle must be surrendered
/// to [`CauseStack::pop_frame`] exactly once.
#[derive(Debug)]
pub struct FrameHandle {
    id: u64,
}

/// Book-keeping for an open frame: where the cause list stood and what the
/// context map held when the frame was pushed.
#[derive(Debug)]
struct FrameRecord {
    id: u64,
    causes_len: usize,
    saved_context: HashMap<ContextKey, ContextValue>,
}

// ---------------------------------------------------------------------------
// CauseStack
// ---------------------------------------------------------------------------

/// Ordered cause sequence + keyed context map, scoped by nested frames.
///
/// One instance per simulation thread; no internal locking.
#[derive(Debug, Default)]
pub struct CauseStack {
    causes: Vec<Cause>,
    context: HashMap<ContextKey, ContextValue>,
    frames: Vec<FrameRecord>,
    next_frame_id: u64,
}

impl CauseStack {
    /// Create an empty cause stack.
    pub fn new() -> Self {
        Self::default()
    }

    // -- frames -------------------------------------------------------------

    /// Open a frame, checkpointing the current cause list and context map.
    pub fn push_frame(&mut self) -> FrameHandle {
        let id = self.next_frame_id;
        self.next_frame_id += 1;
        trace!(frame = id, causes = self.causes.len(), "cause frame pushed");
        self.frames.push(FrameRecord {
            id,
            causes_len: self.causes.len(),
            saved_context: self.context.clone(),
        });
        FrameHandle { id }
    }

    /// Close the innermost frame, restoring the cause list and context map
    /// to their state at the matching [`push_frame`](Self::push_frame).
    ///
    /// Fails fast on a push/pop mismatch: releasing with no frame open, or
    /// with a handle that is not the innermost open frame, returns an error
    /// and mutates nothing.
    pub fn pop_frame(&mut self, handle: FrameHandle) -> Result<(), TrackerError> {
        let open = match self.frames.last() {
            Some(record) => record.id,
            None => {
                return Err(TrackerError::CauseFrameUnderflow {
                    released: handle.id,
                })
            }
        };
        if open != handle.id {
            return Err(TrackerError::CauseFrameMismatch {
                open,
                released: handle.id,
            });
        }
        let record = self.frames.pop().expect("frame checked non-empty above");
        self.causes.truncate(record.causes_len);
        self.context = record.saved_context;
        trace!(frame = record.id, causes = self.causes.len(), "cause frame popped");
        Ok(())
    }

    /// Run `f` inside a fresh frame, releasing it on the way out.
    ///
    /// The release runs after `f` returns regardless of what it returned --
    /// `f` returning an `Err` value still restores cause state before the
    /// error continues outward. If `f` itself leaks an inner frame, the
    /// release reports the mismatch.
    pub fn frame<R>(
        &mut self,
        f: impl FnOnce(&mut CauseStack) -> R,
    ) -> Result<R, TrackerError> {
        let handle = self.push_frame();
        let result = f(self);
        self.pop_frame(handle)?;
        Ok(result)
    }

    /// Number of currently open frames.
    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    // -- causes and context --------------------------------------------------

    /// Append a cause. Consumers reading the "current" cause see the most
    /// recently pushed one.
    pub fn push_cause(&mut self, cause: Cause) {
        self.causes.push(cause);
    }

    /// The most recently pushed cause, if any.
    pub fn current_cause(&self) -> Option<&Cause> {
        self.causes.last()
    }

    /// The full cause sequence, in push order.
    pub fn causes(&self) -> &[Cause] {
        &self.causes
    }

    /// Set or overwrite a context value, visible until the enclosing frame
    /// is released.
    pub fn add_context(&mut self, key: ContextKey, value: ContextValue) {
        self.context.insert(key, value);
    }

    /// The context value under `key`, if present.
    pub fn context(&self, key: &ContextKey) -> Option<&ContextValue> {
        self.context.get(key)
    }

    /// Freeze the current causes and context into an immutable snapshot.
    pub fn snapshot(&self) -> CauseSnapshot {
        CauseSnapshot {
            causes: self.causes.clone(),
            context: self.context.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use causeway_events::cause::SpawnType;
    use causeway_world::block::BlockPos;
    use causeway_world::entity::PlayerId;

    #[test]
    fn frame_restores_causes_and_context() {
        let mut stack = CauseStack::new();
        stack.push_cause(Cause::Player(PlayerId(1)));
        stack.add_context(
            ContextKey::Notifier,
            ContextValue::Player(PlayerId(1)),
        );

        let handle = stack.push_frame();
        stack.push_cause(Cause::Block(BlockPos::new(0, 0, 0)));
        stack.add_context(
            ContextKey::SpawnType,
            ContextValue::SpawnType(SpawnType::DroppedItem),
        );
        // Overwrite a pre-frame key too.
        stack.add_context(
            ContextKey::Notifier,
            ContextValue::Player(PlayerId(9)),
        );
        assert_eq!(stack.causes().len(), 2);

        stack.pop_frame(handle).unwrap();

        assert_eq!(stack.causes(), &[Cause::Player(PlayerId(1))]);
        assert_eq!(
            stack.context(&ContextKey::Notifier),
            Some(&ContextValue::Player(PlayerId(1)))
        );
        assert_eq!(stack.context(&ContextKey::SpawnType), None);
    }

    #[test]
    fn nested_frames_restore_in_order() {
        let mut stack = CauseStack::new();
        let outer = stack.push_frame();
        stack.push_cause(Cause::Rule("outer".to_owned()));
        let inner = stack.push_frame();
        stack.push_cause(Cause::Rule("inner".to_owned()));

        stack.pop_frame(inner).unwrap();
        assert_eq!(stack.causes().len(), 1);
        assert_eq!(stack.current_cause(), Some(&Cause::Rule("outer".to_owned())));

        stack.pop_frame(outer).unwrap();
        assert!(stack.causes().is_empty());
        assert_eq!(stack.frame_depth(), 0);
    }

    #[test]
    fn out_of_order_release_is_detected_and_mutates_nothing() {
        let mut stack = CauseStack::new();
        let outer = stack.push_frame();
        let _inner = stack.push_frame();
        stack.push_cause(Cause::Rule("inner".to_owned()));

        let err = stack.pop_frame(outer).unwrap_err();
        assert!(matches!(err, TrackerError::CauseFrameMismatch { .. }));
        // Nothing was restored or popped.
        assert_eq!(stack.frame_depth(), 2);
        assert_eq!(stack.causes().len(), 1);
    }

    #[test]
    fn release_with_no_open_frame_is_detected() {
        let mut stack = CauseStack::new();
        let handle = stack.push_frame();
        stack.pop_frame(handle).unwrap();

        let mut other = CauseStack::new();
        let stray = other.push_frame();
        let err = stack.pop_frame(stray).unwrap_err();
        assert!(matches!(err, TrackerError::CauseFrameUnderflow { .. }));
    }

    #[test]
    fn scoped_frame_releases_on_err_results_too() {
        let mut stack = CauseStack::new();
        let result: Result<Result<(), &str>, TrackerError> = stack.frame(|stack| {
            stack.push_cause(Cause::Rule("doomed".to_owned()));
            Err("operation failed")
        });
        // The closure's error came through, and the frame was still released.
        assert!(matches!(result, Ok(Err("operation failed"))));
        assert!(stack.causes().is_empty());
        assert_eq!(stack.frame_depth(), 0);
    }

    #[test]
    fn scoped_frame_reports_leaked_inner_frames() {
        let mut stack = CauseStack::new();
        let result = stack.frame(|stack| {
            // Open a frame and "forget" it.
            let _leaked = stack.push_frame();
        });
        assert!(matches!(
            result,
            Err(TrackerError::CauseFrameMismatch { .. })
        ));
    }

    #[test]
    fn current_cause_is_most_recent() {
        let mut stack = CauseStack::new();
        stack.push_cause(Cause::Container(causeway_world::container::ContainerId(3)));
        stack.push_cause(Cause::Player(PlayerId(5)));
        assert_eq!(stack.current_cause(), Some(&Cause::Player(PlayerId(5))));

        let snapshot = stack.snapshot();
        assert_eq!(snapshot.direct(), Some(&Cause::Player(PlayerId(5))));
        assert_eq!(
            snapshot.root(),
            Some(&Cause::Container(causeway_world::container::ContainerId(3)))
        );
    }
}
