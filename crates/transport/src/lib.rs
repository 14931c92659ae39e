//! TCP transport for ring services.
//!
//! This crate carries [`RingService`] calls between nodes:
//! - [`Request`]/[`Response`] wire protocol, one request per service operation
//! - Length-prefixed bincode framing
//! - [`RingServer`], which dispatches frames into a [`ServiceRegistry`]
//! - [`RemoteRingLinks`], a client that implements [`RingService`] remotely
//!
//! [`RingService`]: corelib::RingService
//! [`ServiceRegistry`]: corelib::ServiceRegistry

pub mod codec;
pub mod error;
pub mod protocol;
pub mod receiver;
pub mod sender;

pub use error::TransportError;
pub use protocol::{Envelope, Request, Response};
pub use receiver::RingServer;
pub use sender::{RemoteRingLinks, TcpResolver, DEFAULT_CALL_TIMEOUT};
