//! Wire messages.
//!
//! A client sends an [`Envelope`] naming the target service and one
//! [`Request`]; the server answers with exactly one [`Response`].

use corelib::Node;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// One operation of the ring service surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    GetMyHostname,
    SetMyHostname(String),
    GetMyIp,
    SetMyIp(String),
    GetNext,
    GetPrev,
    SetNext(Node),
    SetPrev(Node),
    SetLinkedNodes { prev: Node, next: Node },
    GetThisNode,
    UpdateLinks(Node),
    GetServerIp,
    SetServerIp(String),
}

impl Request {
    /// Operation name, for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Request::GetMyHostname => "getMyHostname",
            Request::SetMyHostname(_) => "setMyHostname",
            Request::GetMyIp => "getMyIP",
            Request::SetMyIp(_) => "setMyIP",
            Request::GetNext => "getNext",
            Request::GetPrev => "getPrev",
            Request::SetNext(_) => "setNext",
            Request::SetPrev(_) => "setPrev",
            Request::SetLinkedNodes { .. } => "setLinkedNodes",
            Request::GetThisNode => "getThisNode",
            Request::UpdateLinks(_) => "updateLinks",
            Request::GetServerIp => "getServerIP",
            Request::SetServerIp(_) => "setServerIP",
        }
    }
}

/// A request addressed to a named service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub service: String,
    pub request: Request,
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Unit,
    Text(String),
    MaybeText(Option<String>),
    Node(Node),
    MaybeNode(Option<Node>),
    /// The call could not be served.
    Failure(String),
}

impl Response {
    pub fn into_unit(self) -> Result<(), TransportError> {
        match self {
            Response::Unit => Ok(()),
            other => Err(other.unexpected("unit")),
        }
    }

    pub fn into_text(self) -> Result<String, TransportError> {
        match self {
            Response::Text(text) => Ok(text),
            other => Err(other.unexpected("text")),
        }
    }

    pub fn into_maybe_text(self) -> Result<Option<String>, TransportError> {
        match self {
            Response::MaybeText(text) => Ok(text),
            other => Err(other.unexpected("optional text")),
        }
    }

    pub fn into_node(self) -> Result<Node, TransportError> {
        match self {
            Response::Node(node) => Ok(node),
            other => Err(other.unexpected("node")),
        }
    }

    pub fn into_maybe_node(self) -> Result<Option<Node>, TransportError> {
        match self {
            Response::MaybeNode(node) => Ok(node),
            other => Err(other.unexpected("optional node")),
        }
    }

    fn unexpected(self, expected: &'static str) -> TransportError {
        match self {
            Response::Failure(msg) => TransportError::Remote(msg),
            other => TransportError::UnexpectedResponse {
                expected,
                actual: format!("{other:?}"),
            },
        }
    }
}
