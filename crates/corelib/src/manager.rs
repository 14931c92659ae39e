//! Remote-callable façade over one node's [`RingLinks`].
//!
//! All access goes through a single mutex, so `update_links` reads the
//! current neighbours and writes the new one as one step. Two joins racing
//! on the same anchor are applied one after the other.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::network::RingService;
use crate::node::Node;
use crate::ring::{Placement, RingLinks};

/// Owns a node's ring links and the cached coordinator address.
#[derive(Debug)]
pub struct RingLinkManager {
    links: Mutex<RingLinks>,
    server_ip: Mutex<Option<String>>,
}

impl RingLinkManager {
    /// Manager for `node`, starting out as a ring of one.
    pub fn new(node: Node) -> Self {
        Self {
            links: Mutex::new(RingLinks::new(node)),
            server_ip: Mutex::new(None),
        }
    }

    pub fn my_hostname(&self) -> String {
        self.links.lock().hostname().to_string()
    }

    pub fn set_my_hostname(&self, hostname: impl Into<String>) {
        self.links.lock().set_hostname(hostname);
    }

    pub fn my_ip(&self) -> String {
        self.links.lock().ip().to_string()
    }

    pub fn set_my_ip(&self, ip: impl Into<String>) {
        self.links.lock().set_ip(ip);
    }

    pub fn next(&self) -> Node {
        self.links.lock().successor().clone()
    }

    pub fn prev(&self) -> Node {
        self.links.lock().predecessor().clone()
    }

    pub fn set_next(&self, node: Node) {
        debug!(next = %node, "setting successor");
        self.links.lock().set_successor(node);
    }

    pub fn set_prev(&self, node: Node) {
        debug!(prev = %node, "setting predecessor");
        self.links.lock().set_predecessor(node);
    }

    /// Overwrite both neighbours under one lock.
    pub fn set_linked_nodes(&self, prev: Node, next: Node) {
        debug!(%prev, %next, "setting both neighbours");
        let mut links = self.links.lock();
        links.set_predecessor(prev);
        links.set_successor(next);
    }

    pub fn this_node(&self) -> Node {
        self.links.lock().this().clone()
    }

    pub fn server_ip(&self) -> Option<String> {
        self.server_ip.lock().clone()
    }

    pub fn set_server_ip(&self, ip: impl Into<String>) {
        *self.server_ip.lock() = Some(ip.into());
    }

    /// Copy of the current links.
    pub fn links(&self) -> RingLinks {
        self.links.lock().clone()
    }

    /// Fit `new_node` into this member's links.
    ///
    /// - Alone: `new_node` becomes both successor and predecessor, and this
    ///   node is returned so the newcomer can point back at it both ways.
    /// - Between this node and its successor: `new_node` becomes the
    ///   successor and the old successor is returned; it is the newcomer's
    ///   successor.
    /// - Between the predecessor and this node: `new_node` becomes the
    ///   predecessor and nothing is returned.
    /// - Otherwise nothing changes and nothing is returned.
    ///
    /// Meant to be called once per join, on the member nearest the new
    /// node's hash. A second call with the same node usually lands in the
    /// last case.
    pub fn update_links(&self, new_node: Node) -> Option<Node> {
        let mut links = self.links.lock();
        let placement = links.placement(&new_node);
        info!(
            anchor = %links.this(),
            candidate = %new_node,
            ?placement,
            "placing joining node"
        );

        match placement {
            Placement::Singleton => {
                links.set_predecessor(new_node.clone());
                links.set_successor(new_node);
                Some(links.this().clone())
            }
            Placement::Successor => {
                let old_next = links.successor().clone();
                links.set_successor(new_node);
                Some(old_next)
            }
            Placement::Predecessor => {
                links.set_predecessor(new_node);
                None
            }
            Placement::NotAdjacent => None,
        }
    }
}

#[async_trait]
impl RingService for RingLinkManager {
    async fn get_my_hostname(&self) -> Result<String> {
        Ok(self.my_hostname())
    }

    async fn set_my_hostname(&self, hostname: String) -> Result<()> {
        RingLinkManager::set_my_hostname(self, hostname);
        Ok(())
    }

    async fn get_my_ip(&self) -> Result<String> {
        Ok(self.my_ip())
    }

    async fn set_my_ip(&self, ip: String) -> Result<()> {
        RingLinkManager::set_my_ip(self, ip);
        Ok(())
    }

    async fn get_next(&self) -> Result<Node> {
        Ok(self.next())
    }

    async fn get_prev(&self) -> Result<Node> {
        Ok(self.prev())
    }

    async fn set_next(&self, node: Node) -> Result<()> {
        RingLinkManager::set_next(self, node);
        Ok(())
    }

    async fn set_prev(&self, node: Node) -> Result<()> {
        RingLinkManager::set_prev(self, node);
        Ok(())
    }

    async fn set_linked_nodes(&self, prev: Node, next: Node) -> Result<()> {
        RingLinkManager::set_linked_nodes(self, prev, next);
        Ok(())
    }

    async fn get_this_node(&self) -> Result<Node> {
        Ok(self.this_node())
    }

    async fn update_links(&self, new_node: Node) -> Result<Option<Node>> {
        Ok(RingLinkManager::update_links(self, new_node))
    }

    async fn get_server_ip(&self) -> Result<Option<String>> {
        Ok(self.server_ip())
    }

    async fn set_server_ip(&self, ip: String) -> Result<()> {
        RingLinkManager::set_server_ip(self, ip);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring::NodeHash;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn node(hash: u32) -> Node {
        Node::new(hash, format!("node-{hash}"), format!("127.0.0.1:{hash}"))
    }

    fn manager(own: u32, pred: u32, succ: u32) -> RingLinkManager {
        let manager = RingLinkManager::new(node(own));
        manager.set_linked_nodes(node(pred), node(succ));
        manager
    }

    #[test]
    fn test_singleton_join() {
        let a = RingLinkManager::new(node(10));
        let reply = a.update_links(node(40));
        assert_eq!(reply, Some(node(10)));
        assert_eq!(a.next(), node(40));
        assert_eq!(a.prev(), node(40));
    }

    #[test]
    fn test_successor_insertion_returns_old_successor() {
        let a = manager(10, 80, 50);
        let reply = a.update_links(node(30));
        assert_eq!(reply.map(|n| n.hash().0), Some(50));
        assert_eq!(a.next(), node(30));
        assert_eq!(a.prev(), node(80));
    }

    #[test]
    fn test_predecessor_insertion_returns_nothing() {
        // 80 -> 10 wraps past the top of the space.
        let a = manager(10, 80, 50);
        assert_eq!(a.update_links(node(90)), None);
        assert_eq!(a.prev(), node(90));
        assert_eq!(a.next(), node(50));
    }

    #[test]
    fn test_wraparound_successor() {
        let a = manager(90, 40, 5);
        let reply = a.update_links(node(95));
        assert_eq!(reply, Some(node(5)));
        assert_eq!(a.next(), node(95));
    }

    #[test]
    fn test_not_adjacent_is_a_no_op() {
        let a = manager(10, 80, 50);
        assert_eq!(a.update_links(node(60)), None);
        assert_eq!(a.next(), node(50));
        assert_eq!(a.prev(), node(80));
    }

    #[test]
    fn test_boundary_hash_is_a_no_op() {
        // Known edge case: exact matches fall through the strict comparisons.
        let a = manager(10, 80, 50);
        for hash in [10, 50, 80] {
            assert_eq!(a.update_links(node(hash)), None);
        }
        assert_eq!(a.next(), node(50));
        assert_eq!(a.prev(), node(80));
    }

    #[test]
    fn test_repeat_call_goes_nowhere() {
        let a = manager(10, 80, 50);
        assert!(a.update_links(node(30)).is_some());
        assert_eq!(a.update_links(node(30)), None);
        assert_eq!(a.next(), node(30));
    }

    #[test]
    fn test_accessors_round_trip() {
        let a = RingLinkManager::new(node(1));
        a.set_my_hostname("host-x");
        a.set_my_ip("");
        assert_eq!(a.my_hostname(), "host-x");
        assert_eq!(a.my_ip(), "");

        a.set_next(node(7));
        a.set_prev(node(9));
        assert_eq!(a.next(), node(7));
        assert_eq!(a.prev(), node(9));
        assert_eq!(a.this_node(), node(1));
    }

    proptest! {
        #[test]
        fn prop_accessors_round_trip(
            own: u32,
            hostname: String,
            ip: String,
            next_hash: u32,
            next_name: String,
            prev_hash: u32,
            prev_ip: String,
        ) {
            let a = RingLinkManager::new(node(own));
            a.set_my_hostname(hostname.clone());
            a.set_my_ip(ip.clone());
            prop_assert_eq!(a.my_hostname(), hostname);
            prop_assert_eq!(a.my_ip(), ip);

            a.set_next(Node::new(next_hash, next_name.clone(), "127.0.0.1:1"));
            a.set_prev(Node::new(prev_hash, "prev", prev_ip.clone()));
            let next = a.next();
            let prev = a.prev();
            prop_assert_eq!(next.hash(), NodeHash(next_hash));
            prop_assert_eq!(next.hostname(), next_name.as_str());
            prop_assert_eq!(prev.hash(), NodeHash(prev_hash));
            prop_assert_eq!(prev.ip(), prev_ip.as_str());
            prop_assert_eq!(a.this_node(), node(own));
        }
    }

    #[test]
    fn test_server_ip() {
        let a = RingLinkManager::new(node(1));
        assert_eq!(a.server_ip(), None);
        a.set_server_ip("10.0.0.254");
        assert_eq!(a.server_ip().as_deref(), Some("10.0.0.254"));
    }

    #[tokio::test]
    async fn test_service_surface() {
        let a: Arc<dyn RingService> = Arc::new(RingLinkManager::new(node(10)));
        assert_eq!(a.update_links(node(20)).await.unwrap(), Some(node(10)));
        assert_eq!(a.get_next().await.unwrap(), node(20));
        a.set_linked_nodes(node(3), node(4)).await.unwrap();
        assert_eq!(a.get_prev().await.unwrap(), node(3));
        assert_eq!(a.get_next().await.unwrap(), node(4));
        a.set_server_ip("coordinator".into()).await.unwrap();
        assert_eq!(a.get_server_ip().await.unwrap().as_deref(), Some("coordinator"));
    }

    #[test]
    fn test_concurrent_joins_keep_one_successor() {
        // Every candidate lies between 0 and u32::MAX; each call is applied
        // whole, so the final successor is one of them and each reply is a
        // distinct earlier successor.
        let a = Arc::new(manager(0, u32::MAX, u32::MAX));
        let handles: Vec<_> = (1..=16u32)
            .map(|i| {
                let a = Arc::clone(&a);
                std::thread::spawn(move || a.update_links(node(i * 1000)))
            })
            .collect();

        let mut replies: Vec<u32> = handles
            .into_iter()
            .filter_map(|h| h.join().unwrap())
            .map(|n| n.hash().0)
            .collect();
        let handed_out = replies.len();
        replies.sort_unstable();
        replies.dedup();

        // The successor only ever moves closer, so not every call succeeds,
        // but no reply is handed out twice.
        assert_eq!(replies.len(), handed_out);
        let next = a.next().hash().0;
        assert!(next >= 1000 && next <= 16000);
        assert!(!replies.contains(&next));
    }
}
