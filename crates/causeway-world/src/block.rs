//! Block positions and block states.
//!
//! A [`BlockPos`] is a 3D integer coordinate in world space. A [`BlockState`]
//! is the packed description of what occupies a position: the block kind id
//! plus its metadata word (orientation, growth stage, power level -- whatever
//! the host engine encodes there). The tracker never interprets the metadata;
//! it only snapshots, compares, applies, and reverts whole states.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// BlockPos
// ---------------------------------------------------------------------------

/// A 3D integer block coordinate.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East/west coordinate.
    pub x: i32,
    /// Vertical coordinate.
    pub y: i32,
    /// North/south coordinate.
    pub z: i32,
}

impl BlockPos {
    /// Construct a position from its three components.
    #[inline]
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The position directly above this one.
    #[inline]
    pub fn up(self) -> Self {
        Self::new(self.x, self.y + 1, self.z)
    }

    /// The position directly below this one.
    #[inline]
    pub fn down(self) -> Self {
        Self::new(self.x, self.y - 1, self.z)
    }
}

impl fmt::Debug for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockPos({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// BlockState
// ---------------------------------------------------------------------------

/// A packed block state: block kind id plus engine-defined metadata.
///
/// States are plain values -- cheap to copy, compared bitwise. The tracker
/// treats them as opaque; only the host engine knows what `meta` means for a
/// given `id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockState {
    /// The block kind id (0 is air).
    pub id: u16,
    /// Engine-defined metadata word.
    pub meta: u16,
}

impl BlockState {
    /// The empty state: air with no metadata.
    pub const AIR: BlockState = BlockState { id: 0, meta: 0 };

    /// Construct a state from its kind id and metadata.
    #[inline]
    pub fn new(id: u16, meta: u16) -> Self {
        Self { id, meta }
    }

    /// Whether this state is air.
    #[inline]
    pub fn is_air(self) -> bool {
        self.id == 0
    }
}

impl Default for BlockState {
    fn default() -> Self {
        Self::AIR
    }
}

impl fmt::Debug for BlockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockState({}:{})", self.id, self.meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_default_and_empty() {
        assert_eq!(BlockState::default(), BlockState::AIR);
        assert!(BlockState::AIR.is_air());
        assert!(!BlockState::new(1, 0).is_air());
    }

    #[test]
    fn pos_neighbors() {
        let p = BlockPos::new(1, 2, 3);
        assert_eq!(p.up(), BlockPos::new(1, 3, 3));
        assert_eq!(p.down(), BlockPos::new(1, 1, 3));
    }

    #[test]
    fn value_types_round_trip_through_json() {
        let pos = BlockPos::new(-4, 255, 12);
        let json = serde_json::to_string(&pos).unwrap();
        assert_eq!(serde_json::from_str::<BlockPos>(&json).unwrap(), pos);

        let state = BlockState::new(42, 7);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<BlockState>(&json).unwrap(), state);
    }
}
