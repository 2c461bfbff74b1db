//! Group Module
//!
//! A group is a named cache namespace. Reads consult the local bounded
//! cache, coalesce concurrent misses, and route peer-owned keys to the
//! owning peer; everything else loads through the group's data source.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::{ByteView, CacheStats, GuardedCache};
use crate::error::{CacheError, Result};
use crate::flight::SingleFlight;
use crate::peers::{PeerClient, PeerPicker, Source};
use crate::tasks::spawn_sweep_task;

/// How often a group sweeps expired entries by default.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// == Group ==
/// A named cache namespace with its own store, data source, and peer
/// routing.
///
/// All methods are safe for concurrent use. Construction spawns a
/// background sweeper that expires entries for the life of the group;
/// dropping the group stops it.
pub struct Group {
    name: String,
    source: Arc<dyn Source>,
    cache: GuardedCache,
    /// Set at most once via register_peers
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<ByteView>,
    sweeper: JoinHandle<()>,
}

impl Group {
    /// Creates a detached group. Groups are normally created through a
    /// [`Registry`] so they can be looked up by name.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        name: impl Into<String>,
        max_bytes: u64,
        sweep_interval: Duration,
        source: Arc<dyn Source>,
    ) -> Arc<Self> {
        let cache = GuardedCache::new(max_bytes);
        let sweeper = spawn_sweep_task(cache.clone(), sweep_interval);
        Arc::new(Self {
            name: name.into(),
            source,
            cache,
            peers: OnceLock::new(),
            flight: SingleFlight::new(),
            sweeper,
        })
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    // == Register Peers ==
    /// Installs the peer picker deciding which keys live remotely.
    ///
    /// # Panics
    /// Panics if called more than once on the same group.
    pub fn register_peers(&self, picker: Arc<dyn PeerPicker>) {
        if self.peers.set(picker).is_err() {
            panic!("register_peers called more than once");
        }
    }

    // == Get ==
    /// Reads a key: local cache first, then a coalesced load that
    /// fetches from the owning peer or the data source.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        if key.is_empty() {
            return Err(CacheError::KeyRequired);
        }

        if let Some(view) = self.cache.get(key) {
            debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }

        self.load(key).await
    }

    // == Set ==
    /// Writes a value into the local cache with an optional TTL.
    ///
    /// The write is local only; peers holding the key are not updated.
    pub fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) {
        self.cache.insert(key, ByteView::from(value), ttl);
    }

    // == Stats ==
    /// Snapshot of the group's cache counters.
    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // == Load Path ==
    /// Loads a missing key. Concurrent loads of the same key are
    /// coalesced into one flight; every caller shares its result.
    async fn load(&self, key: &str) -> Result<ByteView> {
        self.flight
            .run(key, || async {
                if let Some(picker) = self.peers.get() {
                    if let Some(peer) = picker.pick_peer(key) {
                        match self.fetch_from_peer(peer.as_ref(), key).await {
                            Ok(view) => return Ok(view),
                            Err(err) => {
                                warn!(
                                    group = %self.name,
                                    key,
                                    error = %err,
                                    "peer fetch failed, loading locally"
                                );
                            }
                        }
                    }
                }
                self.load_locally(key).await
            })
            .await
    }

    /// Fetches a peer-owned key. The peer is authoritative for it, so
    /// the response is not copied into the local cache.
    async fn fetch_from_peer(&self, peer: &dyn PeerClient, key: &str) -> Result<ByteView> {
        let bytes = peer.fetch(&self.name, key).await?;
        Ok(ByteView::from(bytes))
    }

    /// Loads through the data source and populates the local cache.
    /// Loaded entries carry no TTL.
    async fn load_locally(&self, key: &str) -> Result<ByteView> {
        let bytes = self.source.get(key).await?;
        let view = ByteView::from(bytes);
        self.cache.insert(key, view.clone(), None);
        Ok(view)
    }
}

impl Drop for Group {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group").field("name", &self.name).finish()
    }
}

// == Registry ==
/// Name→group table. Groups are created once and live as long as the
/// registry holds them; lookups take the read lock only.
///
/// Most callers use the process-wide [`Registry::global`]; tests can
/// run against private registries.
#[derive(Default)]
pub struct Registry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static Registry {
        static GLOBAL: OnceLock<Registry> = OnceLock::new();
        GLOBAL.get_or_init(Registry::new)
    }

    // == New Group ==
    /// Creates a group with the default sweep interval and registers
    /// it under `name`. Registering a name twice replaces the previous
    /// group with a warning; the replaced group's sweeper stops when
    /// its last handle drops.
    pub fn new_group(
        &self,
        name: impl Into<String>,
        max_bytes: u64,
        source: Arc<dyn Source>,
    ) -> Arc<Group> {
        self.new_group_with_sweep(name, max_bytes, DEFAULT_SWEEP_INTERVAL, source)
    }

    /// Creates a group sweeping at `sweep_interval` and registers it.
    pub fn new_group_with_sweep(
        &self,
        name: impl Into<String>,
        max_bytes: u64,
        sweep_interval: Duration,
        source: Arc<dyn Source>,
    ) -> Arc<Group> {
        let name = name.into();
        let group = Group::new(name.clone(), max_bytes, sweep_interval, source);
        let mut groups = self.groups.write().expect("registry lock poisoned");
        if groups.insert(name.clone(), Arc::clone(&group)).is_some() {
            warn!(group = %name, "group name re-registered, replacing previous group");
        }
        group
    }

    // == Get Group ==
    /// Looks up a previously created group.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }
}

/// Creates a group in the process-wide registry.
pub fn new_group(name: impl Into<String>, max_bytes: u64, source: Arc<dyn Source>) -> Arc<Group> {
    Registry::global().new_group(name, max_bytes, source)
}

/// Looks up a group in the process-wide registry.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    Registry::global().get(name)
}
