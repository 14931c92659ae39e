//! Joining a node into an existing ring.
//!
//! [`RingLinkManager::update_links`] only repairs the anchor's own pointers.
//! [`join_ring`] drives the rest: it finds an anchor that accepts the new
//! node, sets the newcomer's links from the anchor's answer, and tells the
//! newcomer's other neighbour about it.
//!
//! Nothing here guards against two nodes joining next to each other at the
//! same time.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::manager::RingLinkManager;
use crate::network::RingService;
use crate::node::Node;
use crate::ring::Placement;

/// Turns a ring member into something that can be called.
pub trait Resolver: Send + Sync {
    fn resolve(&self, node: &Node) -> Result<Arc<dyn RingService>>;
}

impl<F> Resolver for F
where
    F: Fn(&Node) -> Result<Arc<dyn RingService>> + Send + Sync,
{
    fn resolve(&self, node: &Node) -> Result<Arc<dyn RingService>> {
        self(node)
    }
}

/// How a join ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The member that accepted the new node.
    pub anchor: Node,
    /// Which of the anchor's links the new node took.
    pub placement: Placement,
    /// Anchors tried, including the one that accepted.
    pub hops: usize,
}

/// Join `local` into the ring that `entry` belongs to.
///
/// Anchors that report the node as not adjacent are skipped by following
/// their successor, at most `max_hops` times. A node whose hash equals an
/// existing member's is never adjacent and ends in [`Error::HopLimit`].
pub async fn join_ring<R: Resolver + ?Sized>(
    local: &RingLinkManager,
    entry: Arc<dyn RingService>,
    resolver: &R,
    max_hops: usize,
) -> Result<JoinOutcome> {
    let me = local.this_node();
    let mut anchor = entry;

    for hop in 1..=max_hops {
        let this = anchor.get_this_node().await?;
        let prev = anchor.get_prev().await?;
        let next = anchor.get_next().await?;
        debug!(%this, %prev, %next, hop, "trying anchor");

        match anchor.update_links(me.clone()).await? {
            Some(reply) if reply == this => {
                local.set_linked_nodes(this.clone(), this.clone());
                return Ok(finish(me, this, Placement::Singleton, hop));
            }
            Some(old_next) => {
                local.set_linked_nodes(this.clone(), old_next.clone());
                let reply = resolver.resolve(&old_next)?.update_links(me.clone()).await?;
                if reply.is_some() {
                    warn!(neighbour = %old_next, "successor did not take new node as predecessor");
                }
                return Ok(finish(me, this, Placement::Successor, hop));
            }
            None => {
                // A node already sitting at our hash shows up as `prev`
                // without anything having changed.
                if prev != me && anchor.get_prev().await? == me {
                    local.set_linked_nodes(prev.clone(), this.clone());
                    let reply = resolver.resolve(&prev)?.update_links(me.clone()).await?;
                    if reply.as_ref() != Some(&this) {
                        warn!(neighbour = %prev, "predecessor did not take new node as successor");
                    }
                    return Ok(finish(me, this, Placement::Predecessor, hop));
                }
                anchor = resolver.resolve(&next)?;
            }
        }
    }

    Err(Error::HopLimit { hops: max_hops })
}

fn finish(me: Node, anchor: Node, placement: Placement, hops: usize) -> JoinOutcome {
    info!(node = %me, %anchor, ?placement, hops, "joined ring");
    JoinOutcome {
        anchor,
        placement,
        hops,
    }
}
