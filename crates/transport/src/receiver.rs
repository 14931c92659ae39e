//! Server side: accept connections and dispatch calls to registered services.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use corelib::{RingService, ServiceRegistry};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::codec::{read_frame, write_frame};
use crate::error::TransportError;
use crate::protocol::{Envelope, Request, Response};

/// Listens for ring service calls.
///
/// Each connection gets its own task and is served one frame at a time.
pub struct RingServer {
    listener: TcpListener,
    registry: Arc<ServiceRegistry>,
}

impl RingServer {
    pub async fn bind(
        addr: impl ToSocketAddrs,
        registry: Arc<ServiceRegistry>,
    ) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, registry })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the process ends.
    pub async fn run(self) -> Result<(), TransportError> {
        self.run_until(std::future::pending()).await
    }

    /// Serve until `shutdown` completes. Connections already open keep
    /// running on their own tasks.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), TransportError>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(%addr, "ring server listening");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!(%addr, "ring server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(%peer, "accepted connection");
                        let registry = Arc::clone(&self.registry);
                        tokio::spawn(async move {
                            if let Err(e) = serve_connection(stream, registry).await {
                                warn!(%peer, error = %e, "connection failed");
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
            }
        }
    }
}

async fn serve_connection(
    mut stream: TcpStream,
    registry: Arc<ServiceRegistry>,
) -> Result<(), TransportError> {
    while let Some(envelope) = read_frame::<_, Envelope>(&mut stream).await? {
        debug!(service = %envelope.service, op = envelope.request.name(), "call");
        let response = match registry.lookup(&envelope.service) {
            Ok(service) => dispatch(service.as_ref(), envelope.request).await,
            Err(e) => {
                warn!(service = %envelope.service, "call for unknown service");
                Response::Failure(e.to_string())
            }
        };
        write_frame(&mut stream, &response).await?;
    }
    Ok(())
}

/// Run one request against a local service.
pub async fn dispatch(service: &dyn RingService, request: Request) -> Response {
    let result = match request {
        Request::GetMyHostname => service.get_my_hostname().await.map(Response::Text),
        Request::SetMyHostname(hostname) => {
            service.set_my_hostname(hostname).await.map(|_| Response::Unit)
        }
        Request::GetMyIp => service.get_my_ip().await.map(Response::Text),
        Request::SetMyIp(ip) => service.set_my_ip(ip).await.map(|_| Response::Unit),
        Request::GetNext => service.get_next().await.map(Response::Node),
        Request::GetPrev => service.get_prev().await.map(Response::Node),
        Request::SetNext(node) => service.set_next(node).await.map(|_| Response::Unit),
        Request::SetPrev(node) => service.set_prev(node).await.map(|_| Response::Unit),
        Request::SetLinkedNodes { prev, next } => service
            .set_linked_nodes(prev, next)
            .await
            .map(|_| Response::Unit),
        Request::GetThisNode => service.get_this_node().await.map(Response::Node),
        Request::UpdateLinks(node) => service.update_links(node).await.map(Response::MaybeNode),
        Request::GetServerIp => service.get_server_ip().await.map(Response::MaybeText),
        Request::SetServerIp(ip) => service.set_server_ip(ip).await.map(|_| Response::Unit),
    };

    result.unwrap_or_else(|e| Response::Failure(e.to_string()))
}
