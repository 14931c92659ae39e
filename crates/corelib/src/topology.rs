//! Whole-ring views assembled from per-node links.
//!
//! No member stores the ring; it is recovered by walking successor pointers
//! and checked against the ordering invariant.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Result};
use crate::join::Resolver;
use crate::network::RingService;
use crate::node::Node;

/// One member's links as seen at a single moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub this: Node,
    pub next: Node,
    pub prev: Node,
}

impl LinkSnapshot {
    pub async fn fetch(service: &dyn RingService) -> Result<Self> {
        Ok(Self {
            this: service.get_this_node().await?,
            next: service.get_next().await?,
            prev: service.get_prev().await?,
        })
    }
}

impl fmt::Display for LinkSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <- {} -> {}", self.prev.hash(), self.this, self.next.hash())
    }
}

/// Follow successors from `start` back around to `start`.
pub async fn walk_ring<R: Resolver + ?Sized>(
    start: Arc<dyn RingService>,
    resolver: &R,
    max_hops: usize,
) -> Result<Vec<LinkSnapshot>> {
    let first = LinkSnapshot::fetch(start.as_ref()).await?;
    let origin = first.this.clone();
    let mut next = first.next.clone();
    let mut walk = vec![first];

    while next != origin {
        if walk.len() >= max_hops {
            return Err(Error::HopLimit { hops: max_hops });
        }
        let snapshot = LinkSnapshot::fetch(resolver.resolve(&next)?.as_ref()).await?;
        next = snapshot.next.clone();
        walk.push(snapshot);
    }

    Ok(walk)
}

/// A way in which a walked ring breaks the ordering invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingViolation {
    #[error("empty walk")]
    Empty,
    #[error("lone member {0} does not point at itself")]
    LoneMember(Node),
    #[error("{node} expects predecessor {expected} but has {actual}")]
    BrokenBackLink {
        node: Node,
        expected: Node,
        actual: Node,
    },
    #[error("ring wraps {0} times instead of once")]
    Unsorted(usize),
}

/// Check a walk produced by [`walk_ring`].
///
/// A sound ring is a single member pointing at itself, or a cycle that rises
/// in hash order and wraps exactly once, with every predecessor pointer
/// mirroring a successor pointer.
pub fn verify_ring(walk: &[LinkSnapshot]) -> Vec<RingViolation> {
    let mut violations = Vec::new();

    match walk {
        [] => violations.push(RingViolation::Empty),
        [only] => {
            if only.next != only.this || only.prev != only.this {
                violations.push(RingViolation::LoneMember(only.this.clone()));
            }
        }
        _ => {
            let mut wraps = 0;
            for (i, current) in walk.iter().enumerate() {
                let following = &walk[(i + 1) % walk.len()];
                if following.prev != current.this {
                    violations.push(RingViolation::BrokenBackLink {
                        node: following.this.clone(),
                        expected: current.this.clone(),
                        actual: following.prev.clone(),
                    });
                }
                if following.this.hash() <= current.this.hash() {
                    wraps += 1;
                }
            }
            if wraps != 1 {
                violations.push(RingViolation::Unsorted(wraps));
            }
        }
    }

    violations
}
