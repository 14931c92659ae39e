//! One member's view of the ring: itself and its two neighbours.

use crate::node::Node;

/// Where a joining node belongs relative to one member's links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The member is alone; the candidate becomes both of its neighbours.
    Singleton,
    /// The candidate lies between the member and its successor.
    Successor,
    /// The candidate lies between the member's predecessor and the member.
    Predecessor,
    /// The candidate is not next to this member.
    NotAdjacent,
}

/// Successor and predecessor pointers of a single node.
///
/// # Invariants
///
/// - `successor` and `predecessor` always hold a node; a lone member points
///   at itself in both directions.
/// - Setters overwrite unconditionally. Keeping the ring sorted is the job of
///   whoever drives them (see [`RingLinkManager::update_links`]).
///
/// `hostname` and `ip` start as copies of the identity's fields but are
/// updated independently of it.
///
/// [`RingLinkManager::update_links`]: crate::manager::RingLinkManager::update_links
#[derive(Debug, Clone)]
pub struct RingLinks {
    this: Node,
    successor: Node,
    predecessor: Node,
    hostname: String,
    ip: String,
}

impl RingLinks {
    /// Links for a node that is the only member of its ring.
    pub fn new(this: Node) -> Self {
        Self {
            successor: this.clone(),
            predecessor: this.clone(),
            hostname: this.hostname().to_string(),
            ip: this.ip().to_string(),
            this,
        }
    }

    pub fn this(&self) -> &Node {
        &self.this
    }

    pub fn successor(&self) -> &Node {
        &self.successor
    }

    pub fn predecessor(&self) -> &Node {
        &self.predecessor
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn ip(&self) -> &str {
        &self.ip
    }

    pub fn set_successor(&mut self, node: Node) {
        self.successor = node;
    }

    pub fn set_predecessor(&mut self, node: Node) {
        self.predecessor = node;
    }

    pub fn set_hostname(&mut self, hostname: impl Into<String>) {
        self.hostname = hostname.into();
    }

    pub fn set_ip(&mut self, ip: impl Into<String>) {
        self.ip = ip.into();
    }

    /// True while both neighbours are this node itself.
    pub fn is_alone(&self) -> bool {
        self.this == self.successor && self.this == self.predecessor
    }

    /// Decide where `candidate` falls relative to these links, without
    /// changing anything.
    ///
    /// Comparisons are strict: a candidate whose hash equals this node's or a
    /// neighbour's hash is `NotAdjacent` unless the member is alone.
    pub fn placement(&self, candidate: &Node) -> Placement {
        if self.is_alone() {
            return Placement::Singleton;
        }

        let own = self.this.hash();
        let cand = candidate.hash();

        if cand.is_between(own, self.successor.hash()) {
            Placement::Successor
        } else if cand.is_between(self.predecessor.hash(), own) {
            Placement::Predecessor
        } else {
            Placement::NotAdjacent
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(hash: u32) -> Node {
        Node::new(hash, format!("node-{hash}"), format!("10.0.0.{}", hash % 250))
    }

    fn links(own: u32, pred: u32, succ: u32) -> RingLinks {
        let mut links = RingLinks::new(node(own));
        links.set_predecessor(node(pred));
        links.set_successor(node(succ));
        links
    }

    #[test]
    fn test_new_points_at_itself() {
        let links = RingLinks::new(node(42));
        assert!(links.is_alone());
        assert_eq!(links.successor(), &node(42));
        assert_eq!(links.predecessor(), &node(42));
        assert_eq!(links.hostname(), "node-42");
        assert_eq!(links.ip(), "10.0.0.42");
    }

    #[test]
    fn test_hostname_and_ip_are_independent_of_identity() {
        let mut links = RingLinks::new(node(1));
        links.set_hostname("renamed");
        links.set_ip("192.168.1.9");
        assert_eq!(links.hostname(), "renamed");
        assert_eq!(links.ip(), "192.168.1.9");
        assert_eq!(links.this().hostname(), "node-1");
        assert_eq!(links.this().ip(), "10.0.0.1");
    }

    #[test]
    fn test_placement_alone() {
        let links = RingLinks::new(node(10));
        assert_eq!(links.placement(&node(99)), Placement::Singleton);
        assert_eq!(links.placement(&node(1)), Placement::Singleton);
    }

    #[test]
    fn test_placement_successor() {
        assert_eq!(links(10, 80, 50).placement(&node(30)), Placement::Successor);
        // Wrapped successor arc: 90 -> 5.
        assert_eq!(links(90, 40, 5).placement(&node(95)), Placement::Successor);
        assert_eq!(links(90, 40, 5).placement(&node(2)), Placement::Successor);
    }

    #[test]
    fn test_placement_predecessor() {
        // Wrapped predecessor arc: 80 -> 10.
        assert_eq!(links(10, 80, 50).placement(&node(90)), Placement::Predecessor);
        assert_eq!(links(10, 80, 50).placement(&node(3)), Placement::Predecessor);
        assert_eq!(links(50, 20, 70).placement(&node(35)), Placement::Predecessor);
    }

    #[test]
    fn test_placement_not_adjacent() {
        assert_eq!(links(10, 80, 50).placement(&node(60)), Placement::NotAdjacent);
    }

    #[test]
    fn test_placement_boundary_hashes_are_not_adjacent() {
        // Equal hashes are neither strictly before nor strictly after.
        let links = links(10, 80, 50);
        assert_eq!(links.placement(&node(10)), Placement::NotAdjacent);
        assert_eq!(links.placement(&node(50)), Placement::NotAdjacent);
        assert_eq!(links.placement(&node(80)), Placement::NotAdjacent);
    }

    #[test]
    fn test_placement_two_member_ring() {
        // Both pointers name the same peer; the two arcs still split the ring.
        let links = links(10, 50, 50);
        assert!(!links.is_alone());
        assert_eq!(links.placement(&node(30)), Placement::Successor);
        assert_eq!(links.placement(&node(70)), Placement::Predecessor);
        assert_eq!(links.placement(&node(5)), Placement::Predecessor);
    }
}
