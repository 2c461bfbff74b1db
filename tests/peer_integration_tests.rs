//! Integration Tests for Peer Fetching
//!
//! Runs two live nodes and verifies the peer read path end to end:
//! remote fetch over HTTP, no local caching of peer responses, and
//! fallback to the local source when the peer is unreachable.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use peercache::{
    create_router, AppState, Group, HttpPool, Registry, Result as CacheResult, Source,
};

const GROUP: &str = "numbers";

/// Source returning "value-of:<key>" and counting invocations.
struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl Source for CountingSource {
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("value-of:{key}").into_bytes())
    }
}

/// One live node: a registry with the test group, served on an
/// ephemeral port. Returns the group, its source, and the node's peer
/// address.
async fn spawn_node() -> (Arc<Group>, Arc<CountingSource>, String) {
    let source = Arc::new(CountingSource {
        calls: AtomicUsize::new(0),
    });
    let registry = Arc::new(Registry::new());
    let group = registry.new_group(GROUP, 1024, Arc::clone(&source) as Arc<dyn Source>);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = format!("http://{}", listener.local_addr().unwrap());
    let app = create_router(AppState::new(registry));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (group, source, addr)
}

#[tokio::test]
async fn test_remote_fetch_goes_through_peer() {
    let (_group_b, source_b, addr_b) = spawn_node().await;
    let (group_a, source_a, addr_a) = spawn_node().await;

    // A's ring contains only B, so every key is remote from A's side.
    let pool = HttpPool::new(addr_a);
    pool.set_peers(&[addr_b]);
    group_a.register_peers(Arc::new(pool));

    let view = group_a.get("seven").await.unwrap();
    assert_eq!(view.as_slice(), b"value-of:seven");
    assert_eq!(source_a.calls.load(Ordering::SeqCst), 0);
    assert_eq!(source_b.calls.load(Ordering::SeqCst), 1);

    // The peer's response was not cached on A: the second read fetches
    // remotely again and B answers from its own cache.
    let view = group_a.get("seven").await.unwrap();
    assert_eq!(view.as_slice(), b"value-of:seven");
    assert_eq!(source_a.calls.load(Ordering::SeqCst), 0);
    assert_eq!(source_b.calls.load(Ordering::SeqCst), 1);

    let stats_a = group_a.stats();
    assert_eq!(stats_a.hits, 0);
    assert_eq!(stats_a.entries, 0);
}

#[tokio::test]
async fn test_unreachable_peer_falls_back_to_local_source() {
    let (group_a, source_a, addr_a) = spawn_node().await;

    // Nothing listens on port 9; every remote fetch fails.
    let pool = HttpPool::new(addr_a);
    pool.set_peers(&["http://127.0.0.1:9"]);
    group_a.register_peers(Arc::new(pool));

    let view = group_a.get("three").await.unwrap();
    assert_eq!(view.as_slice(), b"value-of:three");
    assert_eq!(source_a.calls.load(Ordering::SeqCst), 1);

    // The fallback load populated the local cache.
    let view = group_a.get("three").await.unwrap();
    assert_eq!(view.as_slice(), b"value-of:three");
    assert_eq!(source_a.calls.load(Ordering::SeqCst), 1);
    assert_eq!(group_a.stats().hits, 1);
}

#[tokio::test]
async fn test_two_member_cluster_serves_all_keys() {
    let (group_b, _source_b, addr_b) = spawn_node().await;
    let (group_a, _source_a, addr_a) = spawn_node().await;

    let members = [addr_a.clone(), addr_b.clone()];
    let pool_a = HttpPool::new(addr_a);
    pool_a.set_peers(&members);
    group_a.register_peers(Arc::new(pool_a));

    let pool_b = HttpPool::new(addr_b);
    pool_b.set_peers(&members);
    group_b.register_peers(Arc::new(pool_b));

    // Every key resolves to the same bytes no matter which member owns
    // it on the ring.
    for i in 0..20 {
        let key = format!("key-{i}");
        let view = group_a.get(&key).await.unwrap();
        assert_eq!(view.to_vec(), format!("value-of:{key}").into_bytes());
    }
}
