//! The phase tracker: the single authoritative interception point.
//!
//! One [`PhaseTracker`] per simulation instance, explicitly constructed and
//! explicitly passed -- never a process-wide singleton. It owns the phase
//! stack, the cause stack, and the flag registry; the host's raw mutation
//! primitives are redirected through it so every mutation can be diverted
//! into event-raising logic instead of applied blind.
//!
//! The tracker is `IDLE` when the phase stack is empty and `PHASE_ACTIVE`
//! otherwise; phases strictly nest (LIFO), and a child phase always unwinds
//! completely before its parent can.

use tracing::{debug, error, trace};

use causeway_events::bus::EventBus;
use causeway_events::cause::Cause;
use causeway_events::event::{Event, EventCategory, SlotTransaction};
use causeway_events::spawn::SpawnPipeline;
use causeway_world::block::{BlockPos, BlockState};
use causeway_world::entity::EntityCandidate;
use causeway_world::world::World;

use crate::cause::CauseStack;
use crate::flag::ChangeFlagRegistry;
use crate::phase::{BlockChangeRecord, PhaseContext, PhaseData};
use crate::unwind::UnwindOutcome;
use crate::TrackerError;

// ---------------------------------------------------------------------------
// PhaseTracker
// ---------------------------------------------------------------------------

/// Phase stack + cause stack + flag registry for one simulation instance.
#[derive(Default)]
pub struct PhaseTracker {
    stack: Vec<PhaseContext>,
    cause: CauseStack,
    flags: ChangeFlagRegistry,
}

impl PhaseTracker {
    /// Create an idle tracker with a freshly-initialized flag registry.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            cause: CauseStack::new(),
            flags: ChangeFlagRegistry::new(),
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The flag registry (mutable: lookups may lazily intern wide masks).
    pub fn flags(&mut self) -> &mut ChangeFlagRegistry {
        &mut self.flags
    }

    /// The cause stack.
    pub fn cause_stack(&self) -> &CauseStack {
        &self.cause
    }

    /// Mutable cause stack, for hosts pushing their own attribution.
    pub fn cause_stack_mut(&mut self) -> &mut CauseStack {
        &mut self.cause
    }

    /// Number of phases currently in flight.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Whether no phase is active.
    pub fn is_idle(&self) -> bool {
        self.stack.is_empty()
    }

    /// The innermost active phase, if any.
    pub fn current_phase(&self) -> Option<&PhaseContext> {
        self.stack.last()
    }

    // -- phase stack --------------------------------------------------------

    /// Begin a phase. Always legal; phases nest LIFO.
    pub fn push_phase(&mut self, data: PhaseData) {
        debug!(kind = ?data.kind(), depth = self.stack.len() + 1, "phase pushed");
        self.stack.push(PhaseContext::new(data));
    }

    /// End the innermost phase and run its unwind exactly once.
    ///
    /// Popping with no phase active is a push/pop mismatch in the host and
    /// fails fast -- no fabricated context, no silent continuation. The
    /// popped context owns its buffers, so they are released on every unwind
    /// exit path, including errors.
    pub fn pop_phase(
        &mut self,
        world: &mut World,
        bus: &mut dyn EventBus,
        spawner: &mut dyn SpawnPipeline,
    ) -> Result<UnwindOutcome, TrackerError> {
        let Some(context) = self.stack.pop() else {
            error!("phase stack underflow: pop with no active phase");
            return Err(TrackerError::PhaseStackUnderflow);
        };
        let behavior = context.kind().behavior();
        debug!(
            unwind = behavior.name,
            depth = self.stack.len(),
            "phase popped"
        );
        (behavior.unwind)(world, bus, spawner, &mut self.cause, context)
    }

    // -- capture entry points -----------------------------------------------

    /// Divert a proposed entity spawn into the active phase's buffer.
    ///
    /// With no phase active there is nothing to attribute the spawn to: the
    /// candidate goes straight to the spawn pipeline with whatever cause
    /// state is current. Returns `true` if the spawn was buffered.
    pub fn capture_entity_spawn(
        &mut self,
        world: &mut World,
        spawner: &mut dyn SpawnPipeline,
        candidate: EntityCandidate,
    ) -> bool {
        match self.stack.last_mut() {
            Some(phase) => {
                trace!(id = ?candidate.id, "entity spawn captured");
                phase.capture_entity(candidate);
                true
            }
            None => {
                let snapshot = self.cause.snapshot();
                spawner.spawn_all(world, vec![candidate], &snapshot);
                false
            }
        }
    }

    /// Record an observed slot transaction into the active phase's buffer.
    ///
    /// Returns `true` if buffered; with no phase active the transaction is
    /// dropped (the change already happened and nothing will unwind it).
    pub fn capture_slot_transaction(&mut self, transaction: SlotTransaction) -> bool {
        match self.stack.last_mut() {
            Some(phase) => {
                trace!(slot = ?transaction.slot, "slot transaction captured");
                phase.capture_slot_transaction(transaction);
                true
            }
            None => {
                trace!(slot = ?transaction.slot, "slot transaction outside any phase; ignored");
                false
            }
        }
    }

    // -- mutation interception ----------------------------------------------

    /// The authoritative entry point for "set block state at position".
    ///
    /// Returns whether the mutation was applied. Policy, in order:
    ///
    /// 1. Nobody listening (neither the pre-change gate nor captured block
    ///    changes): apply directly. Pure fast path -- no allocation, no
    ///    buffering, no cause frame.
    /// 2. Non-authoritative world (client preview): apply directly;
    ///    interception is meaningless off the authoritative timeline.
    /// 3. Otherwise, post the pre-change event inside a scoped cause frame.
    ///    Vetoed: nothing is applied. Allowed: the mutation is applied
    ///    exactly as requested and, when a phase is active, recorded into
    ///    its buffer for post-hoc attribution (and revert, if the phase's
    ///    own event is later vetoed).
    pub fn intercept_block_change(
        &mut self,
        world: &mut World,
        bus: &mut dyn EventBus,
        pos: BlockPos,
        proposed: BlockState,
        raw_flag: u32,
    ) -> Result<bool, TrackerError> {
        let fire_pre = bus.should_fire(EventCategory::ChangeBlockPre);
        let capture_post = bus.should_fire(EventCategory::ChangeBlock) && !self.stack.is_empty();

        if !fire_pre && !capture_post {
            world.set_block_raw(pos, proposed);
            return Ok(true);
        }
        if !world.is_authoritative() {
            world.set_block_raw(pos, proposed);
            return Ok(true);
        }

        if fire_pre {
            // Actor metadata is read off the active phase before the frame
            // borrow; the frame is released before we return on every path.
            let actor = self.stack.last().map(|phase| phase.data().clone());
            let outcome = self.cause.frame(|cause| {
                cause.push_cause(Cause::BlockSnapshot(pos, world.block_at(pos)));
                match &actor {
                    Some(PhaseData::BlockTick {
                        rule: Some(rule), ..
                    }) => cause.push_cause(Cause::Rule(rule.clone())),
                    Some(data) => {
                        if let Some(player) = data.player() {
                            cause.push_cause(Cause::Player(player));
                        }
                    }
                    None => {}
                }
                let event = Event::ChangeBlockPre {
                    positions: vec![pos],
                    proposed: vec![proposed],
                    cause: cause.snapshot(),
                };
                bus.post(&event)
            })?;
            if outcome.is_cancelled() {
                debug!(%pos, "block change vetoed at the pre-change gate");
                return Ok(false);
            }
        }

        let original = world.set_block_raw(pos, proposed);
        if capture_post {
            let flag = self.flags.from_mask(raw_flag);
            if let Some(phase) = self.stack.last_mut() {
                phase.capture_block_change(BlockChangeRecord {
                    pos,
                    original,
                    proposed,
                    flag,
                });
            }
        }
        Ok(true)
    }
}
