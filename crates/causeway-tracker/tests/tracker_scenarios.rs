//! End-to-end interception scenarios: full push/capture/unwind cycles against
//! a live world, a scriptable bus, and a collecting spawn pipeline.

use causeway_events::prelude::*;
use causeway_tracker::prelude::*;
use causeway_world::prelude::*;

fn stone() -> BlockState {
    BlockState::new(1, 0)
}

/// Install a test-writer subscriber so `RUST_LOG=debug cargo test` shows the
/// tracker's phase/unwind logging. Safe to call from every test.
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

fn setup() -> (World, PhaseTracker, RecordingBus, CollectingSpawner) {
    init_logging();
    (
        World::new(true),
        PhaseTracker::new(),
        RecordingBus::listening_to_all(),
        CollectingSpawner::new(),
    )
}

/// Register a 9-slot container, mark it capturing, push a click phase.
fn push_click_phase(
    world: &mut World,
    tracker: &mut PhaseTracker,
    click: ClickKind,
    cursor: Option<CursorTransaction>,
) -> (PlayerId, ContainerId) {
    let player = PlayerId(1);
    let container = ContainerId(10);
    world.add_container(Container::new(container, 9));
    world.container_mut(container).unwrap().set_capturing(true);
    tracker.push_phase(PhaseData::InventoryClick {
        click,
        player,
        container,
        cursor,
    });
    (player, container)
}

// ---------------------------------------------------------------------------
// Cursor transactions
// ---------------------------------------------------------------------------

#[test]
fn vetoed_click_restores_the_cursor() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let original = ItemStackSnapshot::new(ItemId(3), 1);
    let proposed = ItemStackSnapshot::EMPTY;
    let (player, _container) = push_click_phase(
        &mut world,
        &mut tracker,
        ClickKind::Primary,
        Some(CursorTransaction { original, proposed }),
    );
    // The engine already moved the stack off the cursor.
    world.set_cursor(player, proposed);

    bus.script_outcome(PostOutcome::Cancelled);
    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    assert!(outcome.vetoed);
    assert_eq!(world.cursor(player), original);
}

#[test]
fn allowed_click_commits_the_cursor() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let original = ItemStackSnapshot::EMPTY;
    let proposed = ItemStackSnapshot::new(ItemId(3), 1);
    let (player, _container) = push_click_phase(
        &mut world,
        &mut tracker,
        ClickKind::Primary,
        Some(CursorTransaction { original, proposed }),
    );

    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    assert!(!outcome.vetoed);
    assert_eq!(outcome.events_posted, 1);
    assert_eq!(world.cursor(player), proposed);
}

// ---------------------------------------------------------------------------
// Transaction validation
// ---------------------------------------------------------------------------

#[test]
fn non_drag_clicks_discard_foreign_transactions() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let (_player, container) =
        push_click_phase(&mut world, &mut tracker, ClickKind::Primary, None);

    // A transaction against a container that is not the open one.
    let foreign = ContainerId(99);
    world.add_container(Container::new(foreign, 3));
    tracker.capture_slot_transaction(SlotTransaction {
        slot: SlotRef::new(foreign, 0),
        original: ItemStackSnapshot::EMPTY,
        proposed: ItemStackSnapshot::new(ItemId(2), 1),
    });
    // And one out of range for the open container.
    tracker.capture_slot_transaction(SlotTransaction {
        slot: SlotRef::new(container, 40),
        original: ItemStackSnapshot::EMPTY,
        proposed: ItemStackSnapshot::new(ItemId(2), 1),
    });

    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    // Everything was invalid: no event fired, foreign slot untouched.
    assert_eq!(outcome, UnwindOutcome::quiet());
    assert_eq!(bus.post_count(), 0);
    assert_eq!(
        world.slot(SlotRef::new(foreign, 0)).unwrap(),
        ItemStackSnapshot::EMPTY
    );
}

#[test]
fn drag_clicks_skip_transaction_validation() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let (_player, _container) =
        push_click_phase(&mut world, &mut tracker, ClickKind::Drag, None);

    // The drag's final packet may reference slots the validation pass would
    // reject; they are kept as-is.
    let foreign = ContainerId(99);
    world.add_container(Container::new(foreign, 3));
    let stack = ItemStackSnapshot::new(ItemId(2), 1);
    tracker.capture_slot_transaction(SlotTransaction {
        slot: SlotRef::new(foreign, 0),
        original: ItemStackSnapshot::EMPTY,
        proposed: stack,
    });

    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    assert_eq!(outcome.events_posted, 1);
    assert!(!outcome.vetoed);
    // The foreign transaction survived and was committed.
    assert_eq!(world.slot(SlotRef::new(foreign, 0)).unwrap(), stack);
    let Event::ClickContainer { transactions, .. } = &bus.posted()[0] else {
        panic!("expected click event");
    };
    assert_eq!(transactions.len(), 1);
}

// ---------------------------------------------------------------------------
// Cause chains on click events
// ---------------------------------------------------------------------------

#[test]
fn click_events_carry_container_then_player() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let (player, container) =
        push_click_phase(&mut world, &mut tracker, ClickKind::Shift, None);

    tracker.capture_slot_transaction(SlotTransaction {
        slot: SlotRef::new(container, 1),
        original: ItemStackSnapshot::EMPTY,
        proposed: ItemStackSnapshot::new(ItemId(6), 2),
    });
    tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    let Event::ClickContainer { kind, cause, .. } = &bus.posted()[0] else {
        panic!("expected click event");
    };
    // The sub-kind is carried from the phase, not re-derived.
    assert_eq!(*kind, ClickKind::Shift);
    assert_eq!(cause.root(), Some(&Cause::Container(container)));
    assert_eq!(cause.direct(), Some(&Cause::Player(player)));
    assert_eq!(
        cause.context(&ContextKey::Notifier),
        Some(&ContextValue::Player(player))
    );
    // No residual cause state once the unwind is over.
    assert!(tracker.cause_stack().causes().is_empty());
    assert_eq!(tracker.cause_stack().frame_depth(), 0);
}

// ---------------------------------------------------------------------------
// Entity-producing block phases
// ---------------------------------------------------------------------------

#[test]
fn block_break_spawns_drops_with_block_spawning_context() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let pos = BlockPos::new(2, 40, 2);
    let player = PlayerId(8);
    world.set_block_raw(pos, stone());

    tracker.push_phase(PhaseData::BlockBreak { player, pos });
    tracker
        .intercept_block_change(&mut world, &mut bus, pos, BlockState::AIR, masks::DEFAULT)
        .unwrap();
    tracker.capture_entity_spawn(
        &mut world,
        &mut spawner,
        EntityCandidate::new(EntityId(21), "item", pos),
    );

    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    assert_eq!(outcome.entities_spawned, 1);
    assert!(world.has_entity(EntityId(21)));
    let (_, cause) = &spawner.batches()[0];
    assert_eq!(cause.spawn_type(), Some(SpawnType::BlockSpawning));
    assert_eq!(
        cause.context(&ContextKey::Creator),
        Some(&ContextValue::Player(player))
    );
}

#[test]
fn vetoed_spawn_event_drops_the_entities() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    tracker.push_phase(PhaseData::EntityTick {
        entity: EntityId(5),
    });
    tracker.capture_entity_spawn(
        &mut world,
        &mut spawner,
        EntityCandidate::new(EntityId(22), "experience_orb", BlockPos::new(0, 0, 0)),
    );

    // Block buffer is empty, so the first (and only) post is SpawnEntity.
    bus.script_outcome(PostOutcome::Cancelled);
    let outcome = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();

    assert!(outcome.vetoed);
    assert_eq!(outcome.entities_spawned, 0);
    assert_eq!(world.entity_count(), 0);
    let Event::SpawnEntity { entities, cause } = &bus.posted()[0] else {
        panic!("expected spawn event");
    };
    assert_eq!(entities.len(), 1);
    assert_eq!(cause.root(), Some(&Cause::Entity(EntityId(5))));
}

// ---------------------------------------------------------------------------
// Nesting
// ---------------------------------------------------------------------------

#[test]
fn nested_phase_buffers_stay_separate() {
    let (mut world, mut tracker, mut bus, mut spawner) = setup();
    let outer_pos = BlockPos::new(0, 50, 0);
    tracker.push_phase(PhaseData::BlockTick {
        pos: outer_pos,
        rule: None,
    });
    tracker
        .intercept_block_change(&mut world, &mut bus, outer_pos, stone(), masks::DEFAULT)
        .unwrap();

    // An inventory click nests inside the tick.
    let (_player, container) =
        push_click_phase(&mut world, &mut tracker, ClickKind::Primary, None);
    tracker.capture_slot_transaction(SlotTransaction {
        slot: SlotRef::new(container, 0),
        original: ItemStackSnapshot::EMPTY,
        proposed: ItemStackSnapshot::new(ItemId(1), 1),
    });

    // Inner unwind consumes only the inner buffers.
    let inner = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();
    assert_eq!(inner.events_posted, 1);

    // The outer phase still holds its block record.
    assert_eq!(
        tracker.current_phase().unwrap().block_changes().len(),
        1
    );
    let outer = tracker
        .pop_phase(&mut world, &mut bus, &mut spawner)
        .unwrap();
    assert_eq!(outer.events_posted, 1);
    assert!(tracker.is_idle());
}

// ---------------------------------------------------------------------------
// Listener transitions
// ---------------------------------------------------------------------------

#[test]
fn unsubscribing_reinstates_the_fast_path() {
    let (mut world, mut tracker, mut bus, _spawner) = setup();
    let pos = BlockPos::new(9, 9, 9);

    tracker
        .intercept_block_change(&mut world, &mut bus, pos, stone(), masks::DEFAULT)
        .unwrap();
    assert_eq!(bus.post_count(), 1);

    // Listeners go away: interception work stops entirely.
    for category in EventCategory::ALL {
        bus.listeners_mut().unsubscribe(category);
    }
    tracker
        .intercept_block_change(&mut world, &mut bus, pos, BlockState::new(2, 0), masks::NONE)
        .unwrap();
    assert_eq!(bus.post_count(), 1);
    assert_eq!(world.block_at(pos), BlockState::new(2, 0));
}

// ---------------------------------------------------------------------------
// Frame discipline through the public surface
// ---------------------------------------------------------------------------

#[test]
fn host_frame_misuse_is_loud() {
    let (_world, mut tracker, _bus, _spawner) = setup();
    let stack = tracker.cause_stack_mut();
    let outer = stack.push_frame();
    let inner = stack.push_frame();

    assert!(matches!(
        stack.pop_frame(outer),
        Err(TrackerError::CauseFrameMismatch { .. })
    ));
    // The inner frame is still the open one and closes normally.
    stack.pop_frame(inner).unwrap();
}
