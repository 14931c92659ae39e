//! Hash functions that place nodes on the ring.
//!
//! The ring logic never hashes anything itself: a node's position is computed
//! once, up front, by one of these and then carried in [`Node::hash`].
//!
//! [`Node::hash`]: crate::node::Node::hash

use std::hash::Hasher;

use siphasher::sip::SipHasher13;
use xxhash_rust::xxh3::xxh3_64;

use crate::ring::NodeHash;

/// Maps a key (usually a hostname) to a position in the 32-bit hash space.
///
/// Implementations are stateless and thread-safe.
pub trait HashFunction: Send + Sync + 'static {
    /// Hash `key` onto the ring.
    fn hash(&self, key: &[u8]) -> NodeHash;

    /// Returns the name of this hash function.
    fn name(&self) -> &'static str;
}

/// XXH3 folded down to 32 bits. The default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Xxh3Hash;

impl HashFunction for Xxh3Hash {
    fn hash(&self, key: &[u8]) -> NodeHash {
        NodeHash::from_u64(xxh3_64(key))
    }

    fn name(&self) -> &'static str {
        "Xxh3Hash"
    }
}

/// SipHash-1-3 folded down to 32 bits.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHash;

impl HashFunction for SipHash {
    fn hash(&self, key: &[u8]) -> NodeHash {
        let mut hasher = SipHasher13::new();
        hasher.write(key);
        NodeHash::from_u64(hasher.finish())
    }

    fn name(&self) -> &'static str {
        "SipHash"
    }
}
