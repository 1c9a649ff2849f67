//! Arena handle for road-graph edges.
//!
//! Edges live in a single owning `Vec` inside the graph; every cross
//! reference (successors, predecessors, routes, traversal stacks) is an
//! `EdgeIdx` into that `Vec`.  The handle is `Copy + Ord + Hash` so it can be
//! used as a map key and sorted without ceremony.  The inner integer is
//! `pub` for direct indexing, but callers should prefer [`EdgeIdx::index`].
//!
//! `EdgeIdx` is distinct from the edge's *input* identifier (the integer id
//! carried by the source feature), which is not guaranteed to be unique or
//! dense.

use std::fmt;

/// Position of an edge in its graph's edge arena.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeIdx(pub u32);

impl EdgeIdx {
    /// Sentinel meaning "no valid edge" (`u32::MAX`).
    pub const INVALID: EdgeIdx = EdgeIdx(u32::MAX);

    /// Cast to `usize` for direct use as a `Vec` index.
    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Default for EdgeIdx {
    /// Returns the `INVALID` sentinel so uninitialized handles are visibly invalid.
    #[inline(always)]
    fn default() -> Self {
        Self::INVALID
    }
}

impl fmt::Display for EdgeIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeIdx({})", self.0)
    }
}

impl TryFrom<usize> for EdgeIdx {
    type Error = std::num::TryFromIntError;
    fn try_from(n: usize) -> Result<EdgeIdx, Self::Error> {
        u32::try_from(n).map(EdgeIdx)
    }
}
