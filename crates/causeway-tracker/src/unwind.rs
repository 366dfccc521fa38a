//! Per-phase-kind unwind: buffers in, events out, veto outcomes applied.
//!
//! Unwind runs exactly once per phase context, at pop time. Dispatch is a
//! table keyed by phase kind -- each [`UnwindBehavior`] entry holds the
//! unwind function for that kind, in the same spirit as a system registry:
//! plain `fn` pointers, no trait objects, no type introspection.
//!
//! Every unwind follows the same contract: validate capture coherence,
//! derive the cause chain inside a scoped frame, classify the buffers into
//! an event, post it, and apply the outcome -- committing on allow,
//! reverting or discarding on veto. Buffers are drained up front, so cleanup
//! is guaranteed on every exit path, error paths included.

use tracing::{debug, warn};

use causeway_events::bus::EventBus;
use causeway_events::cause::{Cause, ContextKey, ContextValue, SpawnType};
use causeway_events::event::{
    BlockTransaction, ClickKind, CursorTransaction, Event, EventCategory, SlotTransaction,
};
use causeway_events::spawn::SpawnPipeline;
use causeway_world::container::ContainerId;
use causeway_world::entity::PlayerId;
use causeway_world::world::World;

use crate::cause::CauseStack;
use crate::phase::{CaptureBuffers, PhaseContext, PhaseData, PhaseKind};
use crate::TrackerError;

// ---------------------------------------------------------------------------
// UnwindOutcome
// ---------------------------------------------------------------------------

/// Summary of one phase unwind.
///
/// A quiet unwind (all zeros) means nothing was worth an event: empty
/// buffers, or capture state the tracker no longer trusts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnwindOutcome {
    /// Number of events posted during the unwind.
    pub events_posted: usize,
    /// Whether any posted event was vetoed.
    pub vetoed: bool,
    /// Entities handed to the spawn pipeline.
    pub entities_spawned: usize,
}

impl UnwindOutcome {
    /// The no-event outcome.
    pub fn quiet() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Dispatch table
// ---------------------------------------------------------------------------

/// An unwind function: consumes the popped phase context.
pub(crate) type UnwindFn = fn(
    &mut World,
    &mut dyn EventBus,
    &mut dyn SpawnPipeline,
    &mut CauseStack,
    PhaseContext,
) -> Result<UnwindOutcome, TrackerError>;

/// One dispatch-table entry: how a phase kind unwinds.
pub(crate) struct UnwindBehavior {
    /// Diagnostic name for logging.
    pub name: &'static str,
    /// The unwind function.
    pub unwind: UnwindFn,
}

static BLOCK_PHASE: UnwindBehavior = UnwindBehavior {
    name: "block_phase",
    unwind: unwind_block_phase,
};

static INVENTORY_CLICK: UnwindBehavior = UnwindBehavior {
    name: "inventory_click",
    unwind: unwind_inventory_click,
};

impl PhaseKind {
    /// The unwind behavior for this kind.
    pub(crate) fn behavior(self) -> &'static UnwindBehavior {
        match self {
            PhaseKind::BlockTick
            | PhaseKind::EntityTick
            | PhaseKind::BlockBreak
            | PhaseKind::BlockPlace => &BLOCK_PHASE,
            PhaseKind::InventoryClick(_) => &INVENTORY_CLICK,
        }
    }
}

// ---------------------------------------------------------------------------
// Block phases
// ---------------------------------------------------------------------------

/// Unwind for tick/break/place phases: block transactions first, then any
/// entities the operation produced (drops, spawned mobs).
fn unwind_block_phase(
    world: &mut World,
    bus: &mut dyn EventBus,
    spawner: &mut dyn SpawnPipeline,
    cause: &mut CauseStack,
    mut context: PhaseContext,
) -> Result<UnwindOutcome, TrackerError> {
    let data = context.data().clone();
    let buffers = context.drain_buffers();

    if !buffers.slots.is_empty() {
        warn!(
            kind = ?context.kind(),
            discarded = buffers.slots.len(),
            "slot transactions captured outside an inventory phase; discarding"
        );
    }
    if buffers.blocks.is_empty() && buffers.entities.is_empty() {
        return Ok(UnwindOutcome::quiet());
    }

    cause.frame(|cause| {
        push_block_phase_causes(cause, &data);

        let mut outcome = UnwindOutcome::quiet();

        // Block transactions.
        if !buffers.blocks.is_empty() && bus.should_fire(EventCategory::ChangeBlock) {
            let transactions: Vec<BlockTransaction> = buffers
                .blocks
                .iter()
                .map(|record| BlockTransaction {
                    pos: record.pos,
                    original: record.original,
                    proposed: record.proposed,
                })
                .collect();
            let event = Event::ChangeBlock {
                transactions,
                cause: cause.snapshot(),
            };
            outcome.events_posted += 1;
            if bus.post(&event).is_cancelled() {
                // Already applied pre-veto: revert in reverse capture order.
                for record in buffers.blocks.iter().rev() {
                    world.set_block_raw(record.pos, record.original);
                }
                debug!(reverted = buffers.blocks.len(), "block changes vetoed");
                outcome.vetoed = true;
                // The whole operation is vetoed; its entities go with it.
                return Ok(outcome);
            }
        }

        // Entities produced by the operation.
        if !buffers.entities.is_empty() {
            cause.add_context(
                ContextKey::SpawnType,
                ContextValue::SpawnType(SpawnType::BlockSpawning),
            );
            let snapshot = cause.snapshot();
            let allowed = if bus.should_fire(EventCategory::SpawnEntity) {
                let event = Event::SpawnEntity {
                    entities: buffers.entities.clone(),
                    cause: snapshot.clone(),
                };
                outcome.events_posted += 1;
                !bus.post(&event).is_cancelled()
            } else {
                true
            };
            if allowed {
                outcome.entities_spawned = spawner.spawn_all(world, buffers.entities, &snapshot);
            } else {
                debug!("entity spawns vetoed");
                outcome.vetoed = true;
            }
        }

        Ok(outcome)
    })?
}

/// Push the actor causes for a block-family phase.
fn push_block_phase_causes(cause: &mut CauseStack, data: &PhaseData) {
    match data {
        PhaseData::BlockTick { pos, rule } => {
            cause.push_cause(Cause::Block(*pos));
            if let Some(rule) = rule {
                cause.push_cause(Cause::Rule(rule.clone()));
            }
        }
        PhaseData::EntityTick { entity } => {
            cause.push_cause(Cause::Entity(*entity));
        }
        PhaseData::BlockBreak { player, pos } | PhaseData::BlockPlace { player, pos } => {
            cause.push_cause(Cause::Block(*pos));
            cause.push_cause(Cause::Player(*player));
            cause.add_context(ContextKey::Creator, ContextValue::Player(*player));
            cause.add_context(ContextKey::Notifier, ContextValue::Player(*player));
        }
        PhaseData::InventoryClick { .. } => {
            // Dispatched to unwind_inventory_click; nothing to push here.
        }
    }
}

// ---------------------------------------------------------------------------
// Inventory clicks
// ---------------------------------------------------------------------------

/// Unwind for inventory-click phases.
fn unwind_inventory_click(
    world: &mut World,
    bus: &mut dyn EventBus,
    spawner: &mut dyn SpawnPipeline,
    cause: &mut CauseStack,
    mut context: PhaseContext,
) -> Result<UnwindOutcome, TrackerError> {
    let PhaseData::InventoryClick {
        click,
        player,
        container,
        cursor,
    } = context.data().clone()
    else {
        unreachable!("inventory unwind dispatched for {:?}", context.kind())
    };
    let buffers = context.drain_buffers();

    let result = unwind_click_checked(
        world, bus, spawner, cause, click, player, container, cursor, buffers,
    );

    // Guaranteed cleanup: the capture flag is reset on every exit path,
    // including the discard and error branches above.
    if let Ok(open_container) = world.container_mut(container) {
        open_container.set_capturing(false);
    }
    result
}

#[allow(clippy::too_many_arguments)]
fn unwind_click_checked(
    world: &mut World,
    bus: &mut dyn EventBus,
    spawner: &mut dyn SpawnPipeline,
    cause: &mut CauseStack,
    click: ClickKind,
    player: PlayerId,
    container: ContainerId,
    cursor: Option<CursorTransaction>,
    buffers: CaptureBuffers,
) -> Result<UnwindOutcome, TrackerError> {
    if !buffers.blocks.is_empty() {
        warn!(
            discarded = buffers.blocks.len(),
            "block records captured during an inventory click; discarding"
        );
    }

    // Customized containers can turn capturing off mid-phase by overriding
    // the change-detection pass. Captured state is no longer trustworthy:
    // discard it without firing anything.
    if !world.container(container)?.capturing() {
        if !buffers.slots.is_empty() {
            warn!(
                ?container,
                discarded = buffers.slots.len(),
                "container stopped capturing mid-phase; discarding slot transactions"
            );
        }
        return Ok(UnwindOutcome::quiet());
    }

    let mut slots = buffers.slots;
    let entities = buffers.entities;

    if slots.is_empty() && entities.is_empty() && cursor.is_none() {
        return Ok(UnwindOutcome::quiet());
    }

    // Validate transactions against the open container. Drags are exempt:
    // the client sends several packets for one drag and only the final one
    // carries the transactions that matter.
    if click != ClickKind::Drag {
        let slot_count = world.container(container)?.slot_count();
        slots.retain(|transaction| {
            let valid =
                transaction.slot.container == container && transaction.slot.index < slot_count;
            if !valid {
                warn!(
                    slot = ?transaction.slot,
                    "slot transaction outside the open container; discarding"
                );
            }
            valid
        });
        if slots.is_empty() && entities.is_empty() && cursor.is_none() {
            return Ok(UnwindOutcome::quiet());
        }
    }

    cause.frame(|cause| {
        cause.push_cause(Cause::Container(container));
        cause.push_cause(Cause::Player(player));
        cause.add_context(ContextKey::Notifier, ContextValue::Player(player));
        if !entities.is_empty() {
            cause.add_context(
                ContextKey::SpawnType,
                ContextValue::SpawnType(SpawnType::DroppedItem),
            );
        }
        let snapshot = cause.snapshot();

        let mut outcome = UnwindOutcome::quiet();
        let cancelled = if bus.should_fire(EventCategory::ClickContainer) {
            let event = Event::ClickContainer {
                kind: click,
                cursor: cursor.clone(),
                transactions: slots.clone(),
                entities: entities.clone(),
                cause: snapshot.clone(),
            };
            outcome.events_posted += 1;
            bus.post(&event).is_cancelled()
        } else {
            false
        };

        if cancelled {
            outcome.vetoed = true;
            restore_click_state(world, player, &cursor, &slots)?;
            debug!(?click, "inventory click vetoed; slot state restored");
            // Entity candidates are dropped without spawning.
        } else {
            commit_click_state(world, player, &cursor, &slots)?;
            if !entities.is_empty() {
                outcome.entities_spawned = spawner.spawn_all(world, entities, &snapshot);
            }
        }
        Ok(outcome)
    })?
}

/// Re-apply original snapshots to the cursor and every captured slot.
fn restore_click_state(
    world: &mut World,
    player: PlayerId,
    cursor: &Option<CursorTransaction>,
    slots: &[SlotTransaction],
) -> Result<(), TrackerError> {
    if let Some(cursor) = cursor {
        world.set_cursor(player, cursor.original);
    }
    for transaction in slots.iter().rev() {
        world.apply_to_slot(transaction.slot, transaction.original)?;
    }
    Ok(())
}

/// Apply proposed snapshots to the cursor and every captured slot.
///
/// Idempotent when the engine already wrote the proposed values before
/// capture -- committing is then a re-write of what is already there.
fn commit_click_state(
    world: &mut World,
    player: PlayerId,
    cursor: &Option<CursorTransaction>,
    slots: &[SlotTransaction],
) -> Result<(), TrackerError> {
    if let Some(cursor) = cursor {
        world.set_cursor(player, cursor.proposed);
    }
    for transaction in slots {
        world.apply_to_slot(transaction.slot, transaction.proposed)?;
    }
    Ok(())
}
