//! HTTP Transport Module
//!
//! Peer-to-peer side of the cache: a pool that routes keys to peer
//! addresses through the consistent-hash ring, and the HTTP client each
//! remote peer is fetched through. The serving side is the `/_cache`
//! route in the API module.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::peers::{PeerClient, PeerPicker};
use crate::ring::{Ring, DEFAULT_REPLICAS};

// == HTTP Pool ==
/// Peer picker backed by a consistent-hash ring of HTTP peer addresses.
///
/// Membership is replaced wholesale through [`set_peers`]; the ring and
/// client table swap under one write lock, so lookups always observe a
/// consistent pair.
///
/// [`set_peers`]: HttpPool::set_peers
pub struct HttpPool {
    /// This process's own peer address, filtered out of pick results
    self_addr: String,
    replicas: usize,
    state: RwLock<PoolState>,
}

struct PoolState {
    ring: Ring,
    clients: HashMap<String, Arc<HttpPeer>>,
}

impl HttpPool {
    // == Constructors ==
    /// Creates a pool identifying itself as `self_addr`, with the
    /// default virtual-node count.
    pub fn new(self_addr: impl Into<String>) -> Self {
        Self::with_replicas(self_addr, DEFAULT_REPLICAS)
    }

    /// Creates a pool with an explicit virtual-node count.
    pub fn with_replicas(self_addr: impl Into<String>, replicas: usize) -> Self {
        Self {
            self_addr: self_addr.into(),
            replicas,
            state: RwLock::new(PoolState {
                ring: Ring::new(replicas),
                clients: HashMap::new(),
            }),
        }
    }

    // == Set Peers ==
    /// Replaces the pool's membership with `addrs` (typically every
    /// member of the cluster, this process included).
    pub fn set_peers<S: AsRef<str>>(&self, addrs: &[S]) {
        let mut ring = Ring::new(self.replicas);
        ring.add(addrs);

        let http = reqwest::Client::new();
        let clients = addrs
            .iter()
            .map(|addr| addr.as_ref())
            .filter(|addr| *addr != self.self_addr)
            .map(|addr| {
                (
                    addr.to_string(),
                    Arc::new(HttpPeer::new(addr, http.clone())),
                )
            })
            .collect();

        let mut state = self.state.write().expect("pool lock poisoned");
        state.ring = ring;
        state.clients = clients;
    }
}

impl PeerPicker for HttpPool {
    /// Returns the owning peer's client, or None when the key is owned
    /// by this process.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        let state = self.state.read().expect("pool lock poisoned");
        let owner = state.ring.get(key)?;
        if owner == self.self_addr {
            return None;
        }
        debug!(peer = owner, key, "picked remote peer");
        state
            .clients
            .get(owner)
            .cloned()
            .map(|client| client as Arc<dyn PeerClient>)
    }
}

impl std::fmt::Debug for HttpPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpPool")
            .field("self_addr", &self.self_addr)
            .field("replicas", &self.replicas)
            .finish()
    }
}

// == HTTP Peer ==
/// One remote peer, fetched over HTTP.
///
/// The request is `GET {base}/_cache?group=…&key=…`; the response body
/// carries the raw value bytes.
pub struct HttpPeer {
    base: String,
    client: reqwest::Client,
}

impl HttpPeer {
    fn new(base: &str, client: reqwest::Client) -> Self {
        Self {
            base: base.trim_end_matches('/').to_string(),
            client,
        }
    }
}

#[async_trait]
impl PeerClient for HttpPeer {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>> {
        let url = format!("{}/_cache", self.base);
        let response = self
            .client
            .get(&url)
            .query(&[("group", group), ("key", key)])
            .send()
            .await
            .map_err(|err| CacheError::Peer(err.to_string()))?;

        if !response.status().is_success() {
            return Err(CacheError::Peer(format!(
                "{} returned {}",
                self.base,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| CacheError::Peer(err.to_string()))?;
        Ok(bytes.to_vec())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_picks_nobody() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        assert!(pool.pick_peer("k").is_none());
    }

    #[test]
    fn test_single_member_pool_owns_everything() {
        let pool = HttpPool::new("http://127.0.0.1:3000");
        pool.set_peers(&["http://127.0.0.1:3000"]);

        for i in 0..50 {
            assert!(pool.pick_peer(&format!("key-{i}")).is_none());
        }
    }

    #[test]
    fn test_pick_matches_ring_ownership() {
        let members = ["http://127.0.0.1:3000", "http://127.0.0.1:3001"];
        let pool = HttpPool::new(members[0]);
        pool.set_peers(&members);

        let mut ring = Ring::new(DEFAULT_REPLICAS);
        ring.add(&members);

        let mut remote = 0;
        for i in 0..100 {
            let key = format!("key-{i}");
            let owner = ring.get(&key).unwrap();
            match pool.pick_peer(&key) {
                Some(_) => {
                    remote += 1;
                    assert_eq!(owner, members[1]);
                }
                None => assert_eq!(owner, members[0]),
            }
        }
        assert!(remote > 0, "some keys should be owned by the other member");
    }

    #[test]
    fn test_set_peers_replaces_membership() {
        let pool = HttpPool::new("http://self");
        pool.set_peers(&["http://self", "http://other"]);
        pool.set_peers(&["http://self"]);

        for i in 0..50 {
            assert!(pool.pick_peer(&format!("key-{i}")).is_none());
        }
    }

    #[tokio::test]
    async fn test_fetch_from_unreachable_peer_is_a_peer_error() {
        let peer = HttpPeer::new("http://127.0.0.1:1", reqwest::Client::new());
        let result = peer.fetch("g", "k").await;
        assert!(matches!(result, Err(CacheError::Peer(_))));
    }
}
