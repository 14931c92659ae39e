//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to ring services.
///
/// Ring-logic outcomes (such as a candidate that is not adjacent to the
/// anchor) are never errors; they are ordinary return values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The remote peer could not be reached or the exchange was corrupted.
    #[error("transport failure: {0}")]
    Transport(String),
    /// The remote peer answered, but reported a failure of its own.
    #[error("remote failure: {0}")]
    Remote(String),
    /// No service is registered under the requested name.
    #[error("service not found: {0}")]
    ServiceNotFound(String),
    /// A join or ring walk followed `hops` successors without finishing.
    #[error("gave up after {hops} hops")]
    HopLimit { hops: usize },
    /// A node's address could not be turned into an endpoint.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}
