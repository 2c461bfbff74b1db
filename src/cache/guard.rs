//! Guarded Cache Module
//!
//! Thread-safe façade over the LRU store, shared by a group's read
//! path, write path, and background sweeper.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{ByteView, CacheStats, LruStore};

// == Guarded Cache ==
/// Mutex-wrapped LRU store with deferred allocation.
///
/// The handle is cheap to clone and all clones share one store. The
/// underlying LRU is only allocated on the first insert, so a group
/// that never caches anything costs nothing. Critical sections are
/// short and CPU-only; callers must not perform I/O while holding one,
/// and eviction hooks must not call back into the same cache.
#[derive(Clone)]
pub struct GuardedCache {
    inner: Arc<Inner>,
}

struct Inner {
    max_bytes: u64,
    store: Mutex<Option<LruStore<ByteView>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
}

impl GuardedCache {
    // == Constructor ==
    /// Creates a guarded cache with the given byte budget (0 = unbounded).
    pub fn new(max_bytes: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                max_bytes,
                store: Mutex::new(None),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                evictions: Arc::new(AtomicU64::new(0)),
            }),
        }
    }

    // == Get ==
    /// Looks up a key. A lookup before the first insert is a miss and
    /// allocates nothing.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.lock();
        let value = guard.as_mut().and_then(|store| store.get(key).cloned());
        match &value {
            Some(_) => self.inner.hits.fetch_add(1, Ordering::Relaxed),
            None => self.inner.misses.fetch_add(1, Ordering::Relaxed),
        };
        value
    }

    // == Insert ==
    /// Inserts or updates an entry with an optional TTL, allocating the
    /// store on first use.
    pub fn insert(&self, key: &str, value: ByteView, ttl: Option<Duration>) {
        let mut guard = self.lock();
        let store = guard.get_or_insert_with(|| {
            let mut store = LruStore::new(self.inner.max_bytes);
            let evictions = Arc::clone(&self.inner.evictions);
            store.set_on_evicted(Box::new(move |_key, _value| {
                evictions.fetch_add(1, Ordering::Relaxed);
            }));
            store
        });
        store.add(key, value, ttl);
    }

    // == Clean Expired ==
    /// Runs one expiry pass, returning the number of entries removed.
    pub fn clean_expired(&self) -> usize {
        let mut guard = self.lock();
        match guard.as_mut() {
            Some(store) => store.clean_expired(),
            None => 0,
        }
    }

    // == Stats ==
    /// Snapshot of the cache's counters and gauges.
    pub fn stats(&self) -> CacheStats {
        let guard = self.lock();
        let (entries, nbytes) = match guard.as_ref() {
            Some(store) => (store.len(), store.nbytes()),
            None => (0, 0),
        };
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            evictions: self.inner.evictions.load(Ordering::Relaxed),
            entries,
            nbytes,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<LruStore<ByteView>>> {
        self.inner.store.lock().expect("cache lock poisoned")
    }
}

impl std::fmt::Debug for GuardedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardedCache")
            .field("max_bytes", &self.inner.max_bytes)
            .finish()
    }
}
