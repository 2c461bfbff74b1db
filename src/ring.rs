//! Consistent-Hash Ring Module
//!
//! Maps arbitrary keys to peer identities through virtual nodes, so
//! membership changes only move the keys landing on the new arcs.

use std::collections::HashMap;

/// Hash function mapping bytes onto the 32-bit ring.
pub type HashFn = fn(&[u8]) -> u32;

/// Number of virtual nodes claimed per peer by default.
pub const DEFAULT_REPLICAS: usize = 50;

fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

// == Ring ==
/// Consistent-hash ring over peer identities.
///
/// Each added node claims `replicas` positions on the ring; a key is
/// owned by the node at the smallest position at or after the key's
/// hash, wrapping at the top of the space. Lookups are pure functions
/// of (ring state, key). Mutation is not safe concurrently with
/// lookups; callers serialize membership changes externally.
pub struct Ring {
    replicas: usize,
    hash: HashFn,
    /// Virtual-node positions, sorted ascending
    positions: Vec<u32>,
    /// Position to owning node identity
    owners: HashMap<u32, String>,
}

impl Ring {
    // == Constructors ==
    /// Creates a ring hashing with CRC-32/IEEE.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, crc32)
    }

    /// Creates a ring with a caller-supplied hash function.
    pub fn with_hasher(replicas: usize, hash: HashFn) -> Self {
        assert!(replicas > 0, "ring replicas must be at least 1");
        Self {
            replicas,
            hash,
            positions: Vec::new(),
            owners: HashMap::new(),
        }
    }

    // == Add ==
    /// Adds nodes to the ring.
    ///
    /// Each node claims `replicas` positions, hashed from the replica
    /// index concatenated with the node identity. If two positions
    /// collide on the 32-bit space, the last writer owns the position.
    pub fn add<S: AsRef<str>>(&mut self, nodes: &[S]) {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let position = (self.hash)(format!("{i}{node}").as_bytes());
                self.positions.push(position);
                self.owners.insert(position, node.to_string());
            }
        }
        self.positions.sort_unstable();
        self.positions.dedup();
    }

    // == Get ==
    /// Returns the identity owning `key`, or None on an empty ring.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.positions.is_empty() {
            return None;
        }
        let hash = (self.hash)(key.as_bytes());
        let idx = self.positions.partition_point(|&p| p < hash);
        let position = if idx == self.positions.len() {
            self.positions[0]
        } else {
            self.positions[idx]
        };
        self.owners.get(&position).map(String::as_str)
    }

    /// Returns true if no nodes have been added.
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("replicas", &self.replicas)
            .field("positions", &self.positions.len())
            .finish()
    }
}
