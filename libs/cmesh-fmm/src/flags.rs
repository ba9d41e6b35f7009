//! Per-node marching state.

use std::ops::{BitOr, BitOrAssign};

/// Bitset of marching flags attached to every node.
///
/// A node that is [`KNOWN`](Self::KNOWN) or [`UPWIND`](Self::UPWIND) is
/// finalized and its distance never changes again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeFlags(u8);

impl NodeFlags {
    /// No flag set.
    pub const NONE: Self = Self(0);
    /// The node holds a tentative distance and sits in the queue.
    pub const ACTIVE: Self = Self(1);
    /// The node's distance is final.
    pub const KNOWN: Self = Self(1 << 1);
    /// The node has been final long enough that its neighbors were updated
    /// from it.
    pub const UPWIND: Self = Self(1 << 2);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn is_finalized(self) -> bool {
        self.0 & (Self::KNOWN.0 | Self::UPWIND.0) != 0
    }

    /// The most advanced state recorded in the flags.
    pub fn state(self) -> MarchState {
        if self.contains(Self::UPWIND) {
            MarchState::Upwind
        } else if self.contains(Self::KNOWN) {
            MarchState::Known
        } else if self.contains(Self::ACTIVE) {
            MarchState::Active
        } else {
            MarchState::Unknown
        }
    }
}

impl BitOr for NodeFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NodeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.insert(rhs);
    }
}

/// Ordered lifecycle of a node during marching. A node only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MarchState {
    Unknown,
    Active,
    Known,
    Upwind,
}
