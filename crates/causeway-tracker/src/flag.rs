//! Canonicalized block-change flags, interned by raw mask.
//!
//! Host engines describe the side effects of a block mutation with a raw
//! bitmask: notify neighbors, send to clients, re-render, run physics, tell
//! observers. The [`ChangeFlagRegistry`] maps every raw mask to exactly one
//! named [`ChangeFlag`] instance, so flags compare by identity and the name
//! of a mask is stable for the life of the process.
//!
//! Two of the six named bits have *inverted* sense: the
//! `neighbor_shape_update` and `physics` labels appear in a generated name
//! when their bits are **clear**. This mirrors how the host engine's own
//! flag word works; downstream consumers match on the exact generated names,
//! so the algorithm is kept bit-for-bit, quirks included.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

// ---------------------------------------------------------------------------
// Raw mask bits
// ---------------------------------------------------------------------------

/// Raw mask bits and the named mask constants built from them.
pub mod masks {
    /// Notify neighbor blocks of the change.
    pub const NEIGHBOR: u32 = 1 << 0;
    /// Send the change to connected clients.
    pub const NOTIFY_CLIENTS: u32 = 1 << 1;
    /// Skip re-rendering the block client-side.
    pub const IGNORE_RENDER: u32 = 1 << 2;
    /// Force a main-thread re-render client-side.
    pub const FORCE_RE_RENDER: u32 = 1 << 3;
    /// Inverted sense: when clear, neighbor shape updates run.
    pub const DENY_NEIGHBOR_SHAPE_UPDATE: u32 = 1 << 4;
    /// Inverted sense: when clear, block physics run.
    pub const PHYSICS: u32 = 1 << 5;
    /// Inverted sense: when clear, observer blocks are told.
    pub const OBSERVER: u32 = 1 << 6;

    /// No side effects requested.
    pub const NONE: u32 = 0;
    /// Every bit of the base permutation space.
    pub const ALL: u32 = 0x7F;
    /// Neighbor updates with physics suppressed.
    pub const NEIGHBOR_PHYSICS: u32 = NEIGHBOR | PHYSICS;
    /// Neighbor updates with observers suppressed.
    pub const NEIGHBOR_OBSERVER: u32 = NEIGHBOR | OBSERVER;
    /// Physics and observers both suppressed.
    pub const PHYSICS_OBSERVER: u32 = PHYSICS | OBSERVER;
    /// The engine's default update flag: neighbors + client notification.
    pub const DEFAULT: u32 = NEIGHBOR | NOTIFY_CLIENTS;

    /// Size of the eagerly-registered permutation space.
    pub const BASE_PERMUTATIONS: u32 = 128;
}

// ---------------------------------------------------------------------------
// ChangeFlag
// ---------------------------------------------------------------------------

struct FlagData {
    name: String,
    raw: u32,
}

/// An interned, named change-flag descriptor.
///
/// Cheap to clone (an `Arc` handle). Two flags obtained from the same
/// registry with the same raw mask are the *same instance*; use
/// [`same_instance`](ChangeFlag::same_instance) for identity and `==` for
/// mask equality.
#[derive(Clone)]
pub struct ChangeFlag(Arc<FlagData>);

impl ChangeFlag {
    fn new(name: impl Into<String>, raw: u32) -> Self {
        Self(Arc::new(FlagData {
            name: name.into(),
            raw,
        }))
    }

    /// The canonical display name for this mask.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The raw bitmask as the host engine sees it.
    pub fn raw_mask(&self) -> u32 {
        self.0.raw
    }

    /// Whether `self` and `other` are the same interned instance.
    pub fn same_instance(&self, other: &ChangeFlag) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether neighbor blocks are notified.
    pub fn updates_neighbors(&self) -> bool {
        self.0.raw & masks::NEIGHBOR != 0
    }

    /// Whether clients are sent the change.
    pub fn notifies_clients(&self) -> bool {
        self.0.raw & masks::NOTIFY_CLIENTS != 0
    }

    /// Whether client-side re-render is skipped.
    pub fn ignores_render(&self) -> bool {
        self.0.raw & masks::IGNORE_RENDER != 0
    }

    /// Whether a main-thread re-render is forced.
    pub fn forces_re_render(&self) -> bool {
        self.0.raw & masks::FORCE_RE_RENDER != 0
    }

    /// Whether neighbor shape updates run (inverted bit: set means deny).
    pub fn updates_neighbor_shapes(&self) -> bool {
        self.0.raw & masks::DENY_NEIGHBOR_SHAPE_UPDATE == 0
    }

    /// Whether block physics run (inverted bit: set means suppress).
    pub fn performs_physics(&self) -> bool {
        self.0.raw & masks::PHYSICS == 0
    }

    /// Whether observer blocks are told (inverted bit: set means suppress).
    pub fn notifies_observers(&self) -> bool {
        self.0.raw & masks::OBSERVER == 0
    }
}

impl PartialEq for ChangeFlag {
    fn eq(&self, other: &Self) -> bool {
        self.0.raw == other.0.raw
    }
}

impl Eq for ChangeFlag {}

impl fmt::Debug for ChangeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChangeFlag({:#04x} \"{}\")", self.0.raw, self.0.name)
    }
}

impl fmt::Display for ChangeFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.name)
    }
}

// Serialize-only: flags deserialize nowhere because identity lives in the
// registry; re-interning happens via `from_mask` with the serialized mask.
impl Serialize for ChangeFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ChangeFlag", 2)?;
        state.serialize_field("name", &self.0.name)?;
        state.serialize_field("mask", &self.0.raw)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// Name generation
// ---------------------------------------------------------------------------

/// Generate the pipe-joined name for a mask.
///
/// Fixed label order; the last two labels have inverted sense and are
/// appended when their bits are clear.
fn generated_name(mask: u32) -> String {
    let mut parts: Vec<&str> = Vec::new();
    if mask & masks::NEIGHBOR != 0 {
        parts.push("neighbor");
    }
    if mask & masks::NOTIFY_CLIENTS != 0 {
        parts.push("notify_clients");
    }
    if mask & masks::IGNORE_RENDER != 0 {
        parts.push("ignore_render");
    }
    if mask & masks::FORCE_RE_RENDER != 0 {
        parts.push("force_re_render");
    }
    if mask & masks::DENY_NEIGHBOR_SHAPE_UPDATE == 0 {
        parts.push("neighbor_shape_update");
    }
    if mask & masks::PHYSICS == 0 {
        parts.push("physics");
    }
    parts.join("|")
}

/// The fixed display name for a special-cased mask, if any.
fn special_name(mask: u32) -> Option<&'static str> {
    match mask {
        masks::NONE => Some("none"),
        masks::NEIGHBOR => Some("neighbor"),
        masks::DEFAULT => Some("default"),
        masks::PHYSICS => Some("physics"),
        masks::OBSERVER => Some("observer"),
        masks::NEIGHBOR_PHYSICS => Some("neighbor_physics"),
        masks::NEIGHBOR_OBSERVER => Some("neighbor_observer"),
        masks::PHYSICS_OBSERVER => Some("physics_observer"),
        masks::ALL => Some("all"),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// ChangeFlagRegistry
// ---------------------------------------------------------------------------

/// Interning cache from raw mask to canonical [`ChangeFlag`].
///
/// All 128 base permutations are registered eagerly at construction; wider
/// masks some host engines pass (extra native bits above the permutation
/// space) are created lazily on first lookup and cached forever. Lookups
/// take `&mut self` only for that lazy insert -- the registry is written at
/// startup and read thereafter, one instance per simulation thread.
pub struct ChangeFlagRegistry {
    by_mask: HashMap<u32, ChangeFlag>,
    by_name: HashMap<String, ChangeFlag>,
    registration_order: Vec<ChangeFlag>,
}

impl ChangeFlagRegistry {
    /// Build the registry and eagerly register the base permutation space.
    pub fn new() -> Self {
        let mut registry = Self {
            by_mask: HashMap::with_capacity(masks::BASE_PERMUTATIONS as usize),
            by_name: HashMap::with_capacity(masks::BASE_PERMUTATIONS as usize + 1),
            registration_order: Vec::with_capacity(masks::BASE_PERMUTATIONS as usize + 1),
        };
        for mask in 0..masks::BASE_PERMUTATIONS {
            match special_name(mask) {
                Some(name) => {
                    registry.register(ChangeFlag::new(name, mask));
                    // The fully-populated mask answers to its spelled-out
                    // name as well.
                    if mask == masks::ALL {
                        let all = registry.by_mask[&masks::ALL].clone();
                        registry
                            .by_name
                            .insert("neighbor_physics_observer".to_owned(), all);
                    }
                }
                None => registry.register(ChangeFlag::new(generated_name(mask), mask)),
            }
        }
        registry
    }

    fn register(&mut self, flag: ChangeFlag) {
        self.by_mask.insert(flag.raw_mask(), flag.clone());
        self.by_name.insert(flag.name().to_owned(), flag.clone());
        self.registration_order.push(flag);
    }

    /// The canonical flag for `mask`. Idempotent and identity-stable:
    /// repeated calls with the same mask return the same instance.
    pub fn from_mask(&mut self, mask: u32) -> ChangeFlag {
        if let Some(flag) = self.by_mask.get(&mask) {
            return flag.clone();
        }
        // A mask outside the base permutation space: intern it now.
        let flag = ChangeFlag::new(generated_name(mask), mask);
        debug!(mask, name = flag.name(), "interned out-of-range change flag");
        self.register(flag.clone());
        flag
    }

    /// The flag for `mask` with the client-notify bit cleared.
    ///
    /// Identity-preserving fast path: when the bit is already clear the
    /// input instance is returned unchanged.
    pub fn with_client_notify_cleared(&mut self, flag: &ChangeFlag) -> ChangeFlag {
        if flag.raw_mask() & masks::NOTIFY_CLIENTS == 0 {
            return flag.clone();
        }
        self.from_mask(flag.raw_mask() & !masks::NOTIFY_CLIENTS)
    }

    /// The no-side-effects flag.
    pub fn empty(&self) -> ChangeFlag {
        self.by_mask[&masks::NONE].clone()
    }

    /// Look up a flag by its canonical (or alias) name.
    pub fn by_name(&self, name: &str) -> Option<&ChangeFlag> {
        self.by_name.get(name)
    }

    /// Every registered flag, in registration order.
    pub fn values(&self) -> impl Iterator<Item = &ChangeFlag> {
        self.registration_order.iter()
    }
}

impl Default for ChangeFlagRegistry {
    fn default() -> Self {
        Self::new()
    }
}
