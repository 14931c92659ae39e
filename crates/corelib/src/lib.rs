//! Core library for hash-ordered membership rings.
//!
//! Each node knows only its successor and predecessor. This crate provides:
//! - Node identity and the 32-bit hash space with wraparound ordering
//! - Per-node ring links and the join-insertion decision
//! - A lock-guarded link manager exposed through a remote service trait
//! - A service registry for transports to dispatch into
//! - Join and ring-walk helpers built on the service trait

pub mod error;
pub mod hasher;
pub mod join;
pub mod manager;
pub mod network;
pub mod node;
pub mod ring;
pub mod topology;

pub use error::{Error, Result};
pub use hasher::{HashFunction, SipHash, Xxh3Hash};
pub use join::{join_ring, JoinOutcome, Resolver};
pub use manager::RingLinkManager;
pub use network::{RingService, ServiceRegistry, RING_LINKS_SERVICE};
pub use node::Node;
pub use ring::{NodeHash, Placement, RingLinks};
pub use topology::{verify_ring, walk_ring, LinkSnapshot, RingViolation};
