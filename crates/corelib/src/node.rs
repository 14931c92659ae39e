//! Node identity on the ring.
//!
//! A [`Node`] is an immutable identity value. Equality, hashing and ordering
//! look only at the ring position; hostname and address ride along so peers
//! can reach each other.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::hasher::HashFunction;
use crate::ring::NodeHash;

/// Identity of a ring member: its position plus how to reach it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    hash: NodeHash,
    hostname: String,
    ip: String,
}

impl Node {
    pub fn new(hash: u32, hostname: impl Into<String>, ip: impl Into<String>) -> Self {
        Self {
            hash: NodeHash(hash),
            hostname: hostname.into(),
            ip: ip.into(),
        }
    }

    /// Build a node whose position is the hash of its hostname.
    pub fn from_hostname<H: HashFunction + ?Sized>(
        hasher: &H,
        hostname: impl Into<String>,
        ip: impl Into<String>,
    ) -> Self {
        let hostname = hostname.into();
        let hash = hasher.hash(hostname.as_bytes());
        Self {
            hash,
            hostname,
            ip: ip.into(),
        }
    }

    /// Ring position, computed once by a [`HashFunction`].
    pub fn hash(&self) -> NodeHash {
        self.hash
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Reachable address. Over TCP this is the node's `host:port`.
    pub fn ip(&self) -> &str {
        &self.ip
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hash.cmp(&other.hash)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.hostname, self.ip, self.hash)
    }
}
