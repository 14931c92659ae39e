//! Ring-link maintenance.
//!
//! Each member only knows its immediate neighbours. [`RingLinks`] holds those
//! two pointers and decides, from hash comparisons alone, where a joining
//! node belongs relative to them.

pub mod links;
pub mod position;

pub use links::{Placement, RingLinks};
pub use position::NodeHash;
