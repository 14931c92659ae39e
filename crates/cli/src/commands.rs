//! CLI subcommands.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use corelib::{
    join_ring, verify_ring, walk_ring, HashFunction, JoinOutcome, LinkSnapshot, Node, NodeHash,
    RingLinkManager, ServiceRegistry, SipHash, Xxh3Hash, RING_LINKS_SERVICE,
};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use transport::{RemoteRingLinks, RingServer, TcpResolver, TransportError};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a ring node until interrupted.
    Serve(ServeArgs),
    /// Print one node's links as JSON.
    Links {
        /// Address of the node to ask.
        #[arg(long, env = "RINGLINK_NODE")]
        node: SocketAddr,
    },
    /// Follow successors around the ring and check its ordering.
    Walk {
        /// Address of the node to start from.
        #[arg(long, env = "RINGLINK_NODE")]
        node: SocketAddr,
        /// Give up after visiting this many nodes.
        #[arg(long, env = "RINGLINK_MAX_HOPS", default_value_t = 1024)]
        max_hops: usize,
    },
    /// Print the ring position of a hostname.
    Hash {
        hostname: String,
        #[arg(long, value_enum, default_value = "xxh3")]
        hasher: HasherKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HasherKind {
    Xxh3,
    Sip,
}

impl HasherKind {
    pub fn hash(self, key: &str) -> NodeHash {
        match self {
            HasherKind::Xxh3 => Xxh3Hash.hash(key.as_bytes()),
            HasherKind::Sip => SipHash.hash(key.as_bytes()),
        }
    }
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to accept ring calls on.
    #[arg(long, env = "RINGLINK_LISTEN", default_value = "127.0.0.1:4820")]
    pub listen: SocketAddr,
    /// Address peers should use to reach this node. Defaults to the bound
    /// listen address.
    #[arg(long, env = "RINGLINK_ADVERTISE")]
    pub advertise: Option<String>,
    /// Host name of this node. Defaults to the advertised address.
    #[arg(long, env = "RINGLINK_HOSTNAME")]
    pub hostname: Option<String>,
    /// Fixed ring position. Without it the hostname is hashed.
    #[arg(long, env = "RINGLINK_HASH")]
    pub hash: Option<u32>,
    #[arg(long, value_enum, default_value = "xxh3")]
    pub hasher: HasherKind,
    /// Coordinator address to cache on the node.
    #[arg(long, env = "RINGLINK_SERVER_IP")]
    pub server_ip: Option<String>,
    /// Existing member to join through. Without it the node starts a new ring.
    #[arg(long, env = "RINGLINK_JOIN")]
    pub join: Option<SocketAddr>,
    /// Give up joining after trying this many anchors.
    #[arg(long, env = "RINGLINK_MAX_HOPS", default_value_t = 1024)]
    pub max_hops: usize,
}

/// A node that is up and (if asked) joined.
pub struct RunningNode {
    pub manager: Arc<RingLinkManager>,
    pub addr: SocketAddr,
    pub joined: Option<JoinOutcome>,
    pub server: JoinHandle<Result<(), TransportError>>,
}

impl ServeArgs {
    /// Bind, register and (optionally) join. The server keeps running in the
    /// background until `shutdown` completes. A failed join stops the server
    /// and withdraws the registration before returning.
    pub async fn start<F>(
        self,
        registry: Arc<ServiceRegistry>,
        call_timeout: Duration,
        shutdown: F,
    ) -> anyhow::Result<RunningNode>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let server = RingServer::bind(self.listen, Arc::clone(&registry))
            .await
            .with_context(|| format!("binding {}", self.listen))?;
        let addr = server.local_addr()?;

        let advertise = self.advertise.unwrap_or_else(|| addr.to_string());
        let hostname = self.hostname.unwrap_or_else(|| advertise.clone());
        let hash = match self.hash {
            Some(hash) => hash,
            None => self.hasher.hash(&hostname).0,
        };

        let manager = Arc::new(RingLinkManager::new(Node::new(hash, hostname, advertise)));
        if let Some(ip) = self.server_ip {
            manager.set_server_ip(ip);
        }
        registry.register(RING_LINKS_SERVICE, manager.clone());
        info!(node = %manager.this_node(), "node started");

        let server = tokio::spawn(server.run_until(shutdown));

        let joined = match self.join {
            Some(entry) => {
                let anchor = Arc::new(RemoteRingLinks::new(entry).with_call_timeout(call_timeout));
                let resolver = TcpResolver::with_call_timeout(call_timeout);
                match join_ring(&manager, anchor, &resolver, self.max_hops).await {
                    Ok(outcome) => Some(outcome),
                    Err(e) => {
                        server.abort();
                        registry.unregister(RING_LINKS_SERVICE);
                        return Err(e).with_context(|| format!("joining through {entry}"));
                    }
                }
            }
            None => None,
        };

        Ok(RunningNode {
            manager,
            addr,
            joined,
            server,
        })
    }
}

/// What a command produced, for printing.
#[derive(Debug)]
pub enum CommandResult {
    Stopped(Node),
    Links(LinkSnapshot),
    Walk {
        ring: Vec<LinkSnapshot>,
        violations: Vec<String>,
    },
    Hash {
        hostname: String,
        hash: NodeHash,
    },
}

impl Command {
    /// Run the command. Every remote call gives up after `call_timeout`.
    pub async fn execute(self, call_timeout: Duration) -> anyhow::Result<CommandResult> {
        match self {
            Command::Serve(args) => {
                let shutdown = async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!(error = %e, "cannot listen for ctrl-c, serving until killed");
                        std::future::pending::<()>().await;
                    }
                };
                let node = args
                    .start(ServiceRegistry::global(), call_timeout, shutdown)
                    .await?;
                node.server.await??;
                Ok(CommandResult::Stopped(node.manager.this_node()))
            }
            Command::Links { node } => {
                let remote = RemoteRingLinks::new(node).with_call_timeout(call_timeout);
                let snapshot = LinkSnapshot::fetch(&remote).await?;
                Ok(CommandResult::Links(snapshot))
            }
            Command::Walk { node, max_hops } => {
                let start = Arc::new(RemoteRingLinks::new(node).with_call_timeout(call_timeout));
                let resolver = TcpResolver::with_call_timeout(call_timeout);
                let ring = walk_ring(start, &resolver, max_hops).await?;
                let violations = verify_ring(&ring).iter().map(|v| v.to_string()).collect();
                Ok(CommandResult::Walk { ring, violations })
            }
            Command::Hash { hostname, hasher } => {
                let hash = hasher.hash(&hostname);
                Ok(CommandResult::Hash { hostname, hash })
            }
        }
    }
}

impl fmt::Display for CommandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandResult::Stopped(node) => write!(f, "stopped {node}"),
            CommandResult::Links(snapshot) => {
                let json = serde_json::to_string_pretty(snapshot).map_err(|_| fmt::Error)?;
                write!(f, "{json}")
            }
            CommandResult::Walk { ring, violations } => {
                for snapshot in ring {
                    writeln!(f, "{snapshot}")?;
                }
                write!(f, "{} members", ring.len())?;
                for violation in violations {
                    write!(f, "\nviolation: {violation}")?;
                }
                Ok(())
            }
            CommandResult::Hash { hostname, hash } => write!(f, "{hostname} {hash}"),
        }
    }
}
