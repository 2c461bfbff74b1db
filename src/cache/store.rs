//! Cache Store Module
//!
//! Bounded LRU store with per-entry TTL and a heap-indexed expiry sweep.
//! Not safe for concurrent use; callers must serialize access.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::{Duration, Instant};

use crate::cache::entry::{Entry, ExpireItem};
use crate::cache::ByteLen;

/// Sentinel index for "no node".
const NIL: usize = usize::MAX;

/// Eviction hook, invoked whenever an entry leaves the store.
///
/// The hook must not call back into the owning store.
pub type EvictionHook<V> = Box<dyn FnMut(&str, &V) + Send>;

// == Arena Node ==
/// One slot in the recency list. Nodes are linked by index so the list
/// and the key map can reference the same entry without ownership
/// cycles.
#[derive(Debug)]
struct Node<V> {
    entry: Entry<V>,
    prev: usize,
    next: usize,
}

// == LRU Store ==
/// Bounded LRU store with per-entry TTL.
///
/// Composed of an index-linked recency list (head = most recently
/// used), a key→index map in bijection with the list, and a min-heap of
/// expiry deadlines. The heap may contain stale items for keys that
/// were removed or re-added with a different deadline; the clean pass
/// skips those. `nbytes` is the exact sum of key and value sizes over
/// live entries; when `max_bytes > 0` it never exceeds `max_bytes`
/// after a mutation.
pub struct LruStore<V> {
    /// Byte budget, 0 = unbounded
    max_bytes: u64,
    /// Current bytes held, keys plus values
    nbytes: u64,
    /// Node arena; `None` slots are free
    nodes: Vec<Option<Node<V>>>,
    /// Free slots in the arena
    free: Vec<usize>,
    /// Most recently used node
    head: usize,
    /// Least recently used node
    tail: usize,
    /// Key to arena index
    map: HashMap<String, usize>,
    /// Pending expiry deadlines, earliest first
    heap: BinaryHeap<Reverse<ExpireItem>>,
    /// Optional eviction hook
    on_evicted: Option<EvictionHook<V>>,
}

impl<V: ByteLen> LruStore<V> {
    // == Constructor ==
    /// Creates a store with the given byte budget (0 = unbounded).
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            nbytes: 0,
            nodes: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            map: HashMap::new(),
            heap: BinaryHeap::new(),
            on_evicted: None,
        }
    }

    /// Installs a hook invoked for every entry leaving the store,
    /// whether by capacity eviction, expiry, or an explicit removal.
    pub fn set_on_evicted(&mut self, hook: EvictionHook<V>) {
        self.on_evicted = Some(hook);
    }

    // == Add ==
    /// Inserts or updates an entry with an optional TTL.
    ///
    /// `None` or a zero duration means the entry never expires,
    /// regardless of any TTL it had before. Updating a key that already
    /// carries a deadline leaves the old heap item behind as a
    /// tombstone; the new deadline governs. After the mutation, tail
    /// entries are evicted until the byte budget holds.
    pub fn add(&mut self, key: &str, value: V, ttl: Option<Duration>) {
        let expires_at = ttl
            .filter(|ttl| !ttl.is_zero())
            .map(|ttl| Instant::now() + ttl);

        if let Some(&idx) = self.map.get(key) {
            self.detach(idx);
            self.push_front(idx);
            let node = self.node_mut(idx);
            let old_len = node.entry.value.byte_len() as u64;
            let new_len = value.byte_len() as u64;
            node.entry.value = value;
            node.entry.expires_at = expires_at;
            self.nbytes += new_len;
            self.nbytes -= old_len;
        } else {
            self.nbytes += (key.len() + value.byte_len()) as u64;
            let idx = self.alloc(Node {
                entry: Entry {
                    key: key.to_string(),
                    value,
                    expires_at,
                },
                prev: NIL,
                next: NIL,
            });
            self.push_front(idx);
            self.map.insert(key.to_string(), idx);
        }

        if let Some(at) = expires_at {
            self.heap.push(Reverse(ExpireItem {
                at,
                key: key.to_string(),
            }));
        }

        while self.max_bytes > 0 && self.nbytes > self.max_bytes {
            if !self.remove_oldest() {
                break;
            }
        }
    }

    // == Get ==
    /// Looks up a key, refreshing its recency on a hit.
    ///
    /// An entry found past its deadline is removed inline (the eviction
    /// hook fires) and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let idx = *self.map.get(key)?;
        if self.node(idx).entry.is_expired(Instant::now()) {
            self.remove_index(idx);
            return None;
        }
        self.detach(idx);
        self.push_front(idx);
        Some(&self.node(idx).entry.value)
    }

    // == Remove Oldest ==
    /// Evicts the least recently used entry, if any.
    ///
    /// Returns true if an entry was removed.
    pub fn remove_oldest(&mut self) -> bool {
        if self.tail == NIL {
            return false;
        }
        self.remove_index(self.tail);
        true
    }

    // == Clean Expired ==
    /// Removes every entry whose deadline is strictly in the past.
    ///
    /// Pops due heap items until the earliest remaining deadline is in
    /// the future. A popped item only removes its entry when it is the
    /// governing deadline for that entry; items for missing keys or
    /// superseded deadlines are tombstones and are skipped.
    ///
    /// Returns the number of entries removed.
    pub fn clean_expired(&mut self) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        loop {
            let due = matches!(self.heap.peek(), Some(Reverse(item)) if now > item.at);
            if !due {
                break;
            }
            let Some(Reverse(item)) = self.heap.pop() else {
                break;
            };
            if let Some(&idx) = self.map.get(&item.key) {
                if self.node(idx).entry.expires_at == Some(item.at) {
                    self.remove_index(idx);
                    removed += 1;
                }
            }
        }

        removed
    }

    // == Length ==
    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns true if the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Current byte usage, keys plus values.
    pub fn nbytes(&self) -> u64 {
        self.nbytes
    }

    // == Internal: Removal ==
    /// Unlinks a node, drops it from the map, adjusts the byte count,
    /// and fires the eviction hook.
    fn remove_index(&mut self, idx: usize) {
        self.detach(idx);
        let node = self.nodes[idx]
            .take()
            .expect("remove_index on empty arena slot");
        self.free.push(idx);
        self.map.remove(&node.entry.key);
        self.nbytes -= (node.entry.key.len() + node.entry.value.byte_len()) as u64;
        if let Some(hook) = self.on_evicted.as_mut() {
            hook(&node.entry.key, &node.entry.value);
        }
    }

    // == Internal: List Plumbing ==
    fn node(&self, idx: usize) -> &Node<V> {
        self.nodes[idx].as_ref().expect("dangling arena index")
    }

    fn node_mut(&mut self, idx: usize) -> &mut Node<V> {
        self.nodes[idx].as_mut().expect("dangling arena index")
    }

    fn alloc(&mut self, node: Node<V>) -> usize {
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Unlinks `idx` from the recency list. The node stays allocated.
    fn detach(&mut self, idx: usize) {
        let (prev, next) = {
            let node = self.node(idx);
            (node.prev, node.next)
        };
        if prev != NIL {
            self.node_mut(prev).next = next;
        } else if self.head == idx {
            self.head = next;
        }
        if next != NIL {
            self.node_mut(next).prev = prev;
        } else if self.tail == idx {
            self.tail = prev;
        }
    }

    /// Links `idx` in as the new head. The node must be detached.
    fn push_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let node = self.node_mut(idx);
            node.prev = NIL;
            node.next = old_head;
        }
        if old_head != NIL {
            self.node_mut(old_head).prev = idx;
        } else {
            self.tail = idx;
        }
        self.head = idx;
    }
}

impl<V> std::fmt::Debug for LruStore<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LruStore")
            .field("max_bytes", &self.max_bytes)
            .field("nbytes", &self.nbytes)
            .field("len", &self.map.len())
            .field("heap_len", &self.heap.len())
            .finish()
    }
}
