//! Property-Based Tests for Cache Module
//!
//! Uses proptest to verify the store's accounting and eviction
//! invariants over arbitrary operation sequences.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::Duration;

use crate::cache::LruStore;

// == Strategies ==
/// Small keyspace so sequences revisit and overwrite keys.
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-d]{1,3}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9]{0,12}"
}

/// One store operation.
#[derive(Debug, Clone)]
enum StoreOp {
    Add { key: String, value: String },
    Get { key: String },
    RemoveOldest,
}

fn store_op_strategy() -> impl Strategy<Value = StoreOp> {
    prop_oneof![
        4 => (key_strategy(), value_strategy())
            .prop_map(|(key, value)| StoreOp::Add { key, value }),
        3 => key_strategy().prop_map(|key| StoreOp::Get { key }),
        1 => Just(StoreOp::RemoveOldest),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    // *For any* operation sequence, the reported byte count equals the
    // sum of len(key) + len(value) over live entries, the map and list
    // stay the same size, and a positive byte budget is never exceeded.
    #[test]
    fn prop_byte_accounting_is_exact(
        ops in prop::collection::vec(store_op_strategy(), 1..60),
        max_bytes in prop_oneof![Just(0u64), Just(16u64), Just(64u64)],
    ) {
        let mut store: LruStore<String> = LruStore::new(max_bytes);

        // Mirror of the live entries, maintained through the eviction
        // hook so capacity evictions are tracked too.
        let live: Arc<Mutex<HashMap<String, usize>>> = Arc::new(Mutex::new(HashMap::new()));
        let sink = Arc::clone(&live);
        store.set_on_evicted(Box::new(move |key, _value| {
            sink.lock().unwrap().remove(key);
        }));

        for op in ops {
            match op {
                StoreOp::Add { key, value } => {
                    live.lock().unwrap().insert(key.clone(), value.len());
                    store.add(&key, value, None);
                }
                StoreOp::Get { key } => {
                    let _ = store.get(&key);
                }
                StoreOp::RemoveOldest => {
                    store.remove_oldest();
                }
            }

            let model = live.lock().unwrap();
            let expected: u64 = model
                .iter()
                .map(|(key, len)| (key.len() + len) as u64)
                .sum();
            prop_assert_eq!(store.nbytes(), expected, "byte accounting drifted");
            prop_assert_eq!(store.len(), model.len(), "map/list size drifted");
            if max_bytes > 0 {
                prop_assert!(store.nbytes() <= max_bytes, "byte budget exceeded");
            }
        }
    }

    // *For any* valid key-value pair, storing then retrieving returns
    // the stored value.
    #[test]
    fn prop_roundtrip_storage(key in key_strategy(), value in value_strategy()) {
        let mut store: LruStore<String> = LruStore::new(0);
        store.add(&key, value.clone(), None);
        prop_assert_eq!(store.get(&key), Some(&value));
    }

    // *For any* key, a second add wins and leaves one entry.
    #[test]
    fn prop_overwrite_semantics(
        key in key_strategy(),
        value1 in value_strategy(),
        value2 in value_strategy(),
    ) {
        let mut store: LruStore<String> = LruStore::new(0);
        store.add(&key, value1, None);
        store.add(&key, value2.clone(), None);

        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.get(&key), Some(&value2));
    }

    // *For any* full store of uniform-size entries, adding one more
    // evicts exactly the least recently used entry.
    #[test]
    fn prop_lru_eviction_order(n in 2usize..8) {
        // Entries "00".."07" with 4-byte values: 6 bytes each.
        let mut store: LruStore<String> = LruStore::new((n * 6) as u64);
        for i in 0..n {
            store.add(&format!("{i:02}"), "xxxx".to_string(), None);
        }
        prop_assert_eq!(store.len(), n);

        store.add("zz", "xxxx".to_string(), None);

        prop_assert_eq!(store.len(), n);
        prop_assert_eq!(store.get("00"), None, "oldest entry must go first");
        for i in 1..n {
            let k = format!("{:02}", i);
            prop_assert!(store.get(&k).is_some());
        }
        prop_assert!(store.get("zz").is_some());
    }

    // *For any* full store, touching the oldest entry makes the second
    // oldest the eviction candidate.
    #[test]
    fn prop_lru_access_tracking(n in 3usize..8) {
        let mut store: LruStore<String> = LruStore::new((n * 6) as u64);
        for i in 0..n {
            store.add(&format!("{i:02}"), "xxxx".to_string(), None);
        }

        prop_assert!(store.get("00").is_some());
        store.add("zz", "xxxx".to_string(), None);

        prop_assert!(store.get("00").is_some(), "touched entry must survive");
        prop_assert_eq!(store.get("01"), None, "second oldest must be evicted");
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    // *For any* mix of expiring and permanent entries, once the TTL has
    // elapsed the expiring entries are unreachable and one clean pass
    // removes them all.
    #[test]
    fn prop_expired_entries_become_unreachable(
        expiring in prop::collection::hash_set("[a-d]{2}", 1..4),
        permanent in prop::collection::hash_set("[w-z]{2}", 1..4),
    ) {
        let mut store: LruStore<String> = LruStore::new(0);
        for key in &expiring {
            store.add(key, "v".to_string(), Some(Duration::from_millis(10)));
        }
        for key in &permanent {
            store.add(key, "v".to_string(), None);
        }

        sleep(Duration::from_millis(25));

        let removed = store.clean_expired();
        prop_assert_eq!(removed, expiring.len());
        prop_assert_eq!(store.len(), permanent.len());
        for key in &expiring {
            prop_assert_eq!(store.get(key), None);
        }
        for key in &permanent {
            prop_assert!(store.get(key).is_some());
        }
    }
}
