//! Error types for the transport.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while carrying a call across the network.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    /// The peer closed the connection before answering.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer did not connect or answer within the call timeout.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    #[error("expected {expected} response, got {actual}")]
    UnexpectedResponse {
        expected: &'static str,
        actual: String,
    },

    /// The peer answered with a failure of its own.
    #[error("{0}")]
    Remote(String),
}

impl From<TransportError> for corelib::Error {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Remote(msg) => corelib::Error::Remote(msg),
            other => corelib::Error::Transport(other.to_string()),
        }
    }
}
