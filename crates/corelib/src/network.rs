//! Transport-agnostic contract for remote ring services.
//!
//! [`RingService`] is the surface one node exposes to its peers. A local
//! [`RingLinkManager`] implements it directly; a transport crate implements it
//! again as a client stub that forwards each call over the wire. Servers look
//! services up by name in a [`ServiceRegistry`].
//!
//! [`RingLinkManager`]: crate::manager::RingLinkManager

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::node::Node;

/// Name under which a node's link manager is registered by default.
pub const RING_LINKS_SERVICE: &str = "ring-links";

/// Remote-callable ring operations.
///
/// Every call is one synchronous request/response. Errors only ever describe
/// a failure to complete the call; "no node" answers are `Ok(None)`.
#[async_trait]
pub trait RingService: Send + Sync {
    async fn get_my_hostname(&self) -> Result<String>;
    async fn set_my_hostname(&self, hostname: String) -> Result<()>;
    async fn get_my_ip(&self) -> Result<String>;
    async fn set_my_ip(&self, ip: String) -> Result<()>;

    /// Current successor.
    async fn get_next(&self) -> Result<Node>;
    /// Current predecessor.
    async fn get_prev(&self) -> Result<Node>;
    async fn set_next(&self, node: Node) -> Result<()>;
    async fn set_prev(&self, node: Node) -> Result<()>;
    /// Overwrite both neighbours at once.
    async fn set_linked_nodes(&self, prev: Node, next: Node) -> Result<()>;
    /// Identity of the node behind this service.
    async fn get_this_node(&self) -> Result<Node>;

    /// Offer `new_node` to this member as a neighbour. See
    /// [`RingLinkManager::update_links`] for the meaning of the reply.
    ///
    /// [`RingLinkManager::update_links`]: crate::manager::RingLinkManager::update_links
    async fn update_links(&self, new_node: Node) -> Result<Option<Node>>;

    /// Cached coordinator address, if one was ever set.
    async fn get_server_ip(&self) -> Result<Option<String>>;
    async fn set_server_ip(&self, ip: String) -> Result<()>;
}

/// Named services a server can dispatch to.
#[derive(Default)]
pub struct ServiceRegistry {
    services: DashMap<String, Arc<dyn RingService>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<ServiceRegistry> {
        static GLOBAL: OnceLock<Arc<ServiceRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ServiceRegistry::new())))
    }

    /// Register `service` under `name`, returning whatever it replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        service: Arc<dyn RingService>,
    ) -> Option<Arc<dyn RingService>> {
        let name = name.into();
        debug!(service = %name, "registering ring service");
        self.services.insert(name, service)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn RingService>> {
        self.services.remove(name).map(|(_, service)| service)
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn RingService>> {
        self.services
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.services.iter().map(|e| e.key().clone()).collect();
        f.debug_struct("ServiceRegistry").field("services", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manager::RingLinkManager;

    #[tokio::test]
    async fn test_register_and_lookup() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());

        let manager = Arc::new(RingLinkManager::new(Node::new(5, "five", "127.0.0.1:5")));
        assert!(registry.register(RING_LINKS_SERVICE, manager).is_none());
        assert_eq!(registry.len(), 1);

        let service = registry.lookup(RING_LINKS_SERVICE).unwrap();
        assert_eq!(service.get_this_node().await.unwrap().hash().0, 5);
    }

    #[test]
    fn test_lookup_missing() {
        let registry = ServiceRegistry::new();
        assert_eq!(
            registry.lookup("nope").err(),
            Some(Error::ServiceNotFound("nope".into()))
        );
    }

    #[test]
    fn test_unregister() {
        let registry = ServiceRegistry::new();
        let manager = Arc::new(RingLinkManager::new(Node::new(1, "one", "ip")));
        registry.register("a", manager);
        assert!(registry.unregister("a").is_some());
        assert!(registry.unregister("a").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&ServiceRegistry::global(), &ServiceRegistry::global()));
    }
}
