//! Client side: a [`RingService`] whose every call goes over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelib::{Error, Node, Resolver, RingService, RING_LINKS_SERVICE};
use dashmap::DashMap;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::codec::{read_frame, write_frame};
use crate::error::TransportError;
use crate::protocol::{Envelope, Request, Response};

/// Upper bound on connecting plus one request/response exchange.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Stub for a ring service hosted by another process.
///
/// Holds at most one connection, opened on first use. The connection is
/// checked out for the length of a call and only returned after a full
/// reply, so a failed, timed out or cancelled call never leaves a half-read
/// stream behind. The failed call itself is not retried.
pub struct RemoteRingLinks {
    addr: SocketAddr,
    service: String,
    call_timeout: Duration,
    conn: Mutex<Option<TcpStream>>,
}

impl RemoteRingLinks {
    /// Stub for the default link service at `addr`.
    pub fn new(addr: SocketAddr) -> Self {
        Self::with_service(addr, RING_LINKS_SERVICE)
    }

    pub fn with_service(addr: SocketAddr, service: impl Into<String>) -> Self {
        Self {
            addr,
            service: service.into(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            conn: Mutex::new(None),
        }
    }

    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Stub for the node's own service, reached through its `ip` field.
    pub fn for_node(node: &Node) -> corelib::Result<Self> {
        let addr = node
            .ip()
            .parse()
            .map_err(|_| Error::InvalidAddress(node.ip().to_string()))?;
        Ok(Self::new(addr))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn call_timeout(&self) -> Duration {
        self.call_timeout
    }

    async fn call(&self, request: Request) -> Result<Response, TransportError> {
        let op = request.name();
        let envelope = Envelope {
            service: self.service.clone(),
            request,
        };

        let mut slot = self.conn.lock().await;
        let mut stream = match slot.take() {
            Some(stream) => stream,
            None => {
                debug!(addr = %self.addr, "connecting");
                timeout(self.call_timeout, TcpStream::connect(self.addr))
                    .await
                    .map_err(|_| TransportError::Timeout(self.call_timeout))??
            }
        };

        let result = match timeout(self.call_timeout, exchange(&mut stream, &envelope)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(self.call_timeout)),
        };
        match result {
            Ok(response) => {
                *slot = Some(stream);
                Ok(response)
            }
            Err(e) => {
                warn!(addr = %self.addr, op, error = %e, "call failed, dropping connection");
                Err(e)
            }
        }
    }
}

async fn exchange(stream: &mut TcpStream, envelope: &Envelope) -> Result<Response, TransportError> {
    write_frame(stream, envelope).await?;
    read_frame(stream)
        .await?
        .ok_or(TransportError::ConnectionClosed)
}

#[async_trait]
impl RingService for RemoteRingLinks {
    async fn get_my_hostname(&self) -> corelib::Result<String> {
        Ok(self.call(Request::GetMyHostname).await?.into_text()?)
    }

    async fn set_my_hostname(&self, hostname: String) -> corelib::Result<()> {
        Ok(self.call(Request::SetMyHostname(hostname)).await?.into_unit()?)
    }

    async fn get_my_ip(&self) -> corelib::Result<String> {
        Ok(self.call(Request::GetMyIp).await?.into_text()?)
    }

    async fn set_my_ip(&self, ip: String) -> corelib::Result<()> {
        Ok(self.call(Request::SetMyIp(ip)).await?.into_unit()?)
    }

    async fn get_next(&self) -> corelib::Result<Node> {
        Ok(self.call(Request::GetNext).await?.into_node()?)
    }

    async fn get_prev(&self) -> corelib::Result<Node> {
        Ok(self.call(Request::GetPrev).await?.into_node()?)
    }

    async fn set_next(&self, node: Node) -> corelib::Result<()> {
        Ok(self.call(Request::SetNext(node)).await?.into_unit()?)
    }

    async fn set_prev(&self, node: Node) -> corelib::Result<()> {
        Ok(self.call(Request::SetPrev(node)).await?.into_unit()?)
    }

    async fn set_linked_nodes(&self, prev: Node, next: Node) -> corelib::Result<()> {
        Ok(self
            .call(Request::SetLinkedNodes { prev, next })
            .await?
            .into_unit()?)
    }

    async fn get_this_node(&self) -> corelib::Result<Node> {
        Ok(self.call(Request::GetThisNode).await?.into_node()?)
    }

    async fn update_links(&self, new_node: Node) -> corelib::Result<Option<Node>> {
        Ok(self.call(Request::UpdateLinks(new_node)).await?.into_maybe_node()?)
    }

    async fn get_server_ip(&self) -> corelib::Result<Option<String>> {
        Ok(self.call(Request::GetServerIp).await?.into_maybe_text()?)
    }

    async fn set_server_ip(&self, ip: String) -> corelib::Result<()> {
        Ok(self.call(Request::SetServerIp(ip)).await?.into_unit()?)
    }
}

/// Resolves ring members to TCP stubs, reusing one stub per address.
pub struct TcpResolver {
    call_timeout: Duration,
    stubs: DashMap<SocketAddr, Arc<RemoteRingLinks>>,
}

impl Default for TcpResolver {
    fn default() -> Self {
        Self::with_call_timeout(DEFAULT_CALL_TIMEOUT)
    }
}

impl TcpResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver whose stubs give up on a call after `call_timeout`.
    pub fn with_call_timeout(call_timeout: Duration) -> Self {
        Self {
            call_timeout,
            stubs: DashMap::new(),
        }
    }
}

impl Resolver for TcpResolver {
    fn resolve(&self, node: &Node) -> corelib::Result<Arc<dyn RingService>> {
        let stub = RemoteRingLinks::for_node(node)?.with_call_timeout(self.call_timeout);
        let stub = self
            .stubs
            .entry(stub.addr())
            .or_insert_with(|| Arc::new(stub))
            .clone();
        Ok(stub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_node_parses_address() {
        let stub = RemoteRingLinks::for_node(&Node::new(1, "a", "127.0.0.1:4100")).unwrap();
        assert_eq!(stub.addr(), "127.0.0.1:4100".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_for_node_rejects_bare_host() {
        let result = RemoteRingLinks::for_node(&Node::new(1, "a", "10.0.0.1"));
        assert_eq!(result.err(), Some(Error::InvalidAddress("10.0.0.1".into())));
    }

    #[test]
    fn test_resolver_reuses_stubs() {
        let resolver = TcpResolver::new();
        let a = resolver.resolve(&Node::new(1, "a", "127.0.0.1:4100")).unwrap();
        let b = resolver.resolve(&Node::new(2, "b", "127.0.0.1:4100")).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_call_timeout_defaults_and_overrides() {
        let addr: SocketAddr = "127.0.0.1:4100".parse().unwrap();
        assert_eq!(RemoteRingLinks::new(addr).call_timeout(), DEFAULT_CALL_TIMEOUT);
        let stub = RemoteRingLinks::new(addr).with_call_timeout(Duration::from_millis(250));
        assert_eq!(stub.call_timeout(), Duration::from_millis(250));
    }
}
