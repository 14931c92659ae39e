//! Positions in the 32-bit hash space.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A position on the ring: an unsigned 32-bit value that wraps from
/// `u32::MAX` back to `0`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeHash(pub u32);

impl NodeHash {
    pub const MIN: NodeHash = NodeHash(0);
    pub const MAX: NodeHash = NodeHash(u32::MAX);

    /// Fold a 64-bit digest into the ring's 32-bit space.
    #[inline]
    pub fn from_u64(digest: u64) -> Self {
        NodeHash((digest >> 32) as u32 ^ digest as u32)
    }

    /// Clockwise distance from `self` to `other`.
    #[inline]
    pub fn distance_to(self, other: NodeHash) -> u32 {
        other.0.wrapping_sub(self.0)
    }

    /// True if `self` lies strictly between `from` and `to`, walking
    /// clockwise from `from`.
    ///
    /// Both ends are exclusive, so a value equal to either boundary is never
    /// between them, and an empty arc (`from == to`) contains nothing.
    #[inline]
    pub fn is_between(self, from: NodeHash, to: NodeHash) -> bool {
        if from < to {
            from < self && self < to
        } else if from > to {
            self > from || self < to
        } else {
            false
        }
    }
}

impl From<u32> for NodeHash {
    fn from(value: u32) -> Self {
        NodeHash(value)
    }
}

impl fmt::Display for NodeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
