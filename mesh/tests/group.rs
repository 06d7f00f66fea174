//! Group coordinator behavior against stub loaders and peers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use meshcache::{
    BoxError, CacheError, GroupBuilder, Loader, LoaderFn, PeerClient, PeerPicker, Registry,
    get_group,
};

/// Loader over a fixed table, counting invocations per key.
struct TableLoader {
    table: HashMap<&'static str, &'static str>,
    loads: AtomicUsize,
}

impl TableLoader {
    fn scores() -> Self {
        Self {
            table: HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]),
            loads: AtomicUsize::new(0),
        }
    }

    fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Loader for TableLoader {
    async fn load(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        match self.table.get(key) {
            Some(value) => Ok(value.as_bytes().to_vec()),
            None => Err(format!("{key} does not exist").into()),
        }
    }
}

struct StubPicker(Arc<dyn PeerClient>);

impl PeerPicker for StubPicker {
    fn pick_peer(&self, _key: &str) -> Option<Arc<dyn PeerClient>> {
        Some(self.0.clone())
    }
}

struct StaticPeer(&'static [u8]);

#[async_trait]
impl PeerClient for StaticPeer {
    async fn fetch(&self, _group: &str, _key: &str) -> Result<Bytes, BoxError> {
        Ok(Bytes::from_static(self.0))
    }
}

struct FailingPeer;

#[async_trait]
impl PeerClient for FailingPeer {
    async fn fetch(&self, _group: &str, _key: &str) -> Result<Bytes, BoxError> {
        Err("peer unreachable".into())
    }
}

#[tokio::test]
async fn test_loads_once_then_hits() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 2 << 10, loader.clone()).register_in(&Registry::new());

    for (key, value) in [("Tom", "630"), ("Jack", "589"), ("Sam", "567")] {
        let view = group.get(key).await.expect("key exists in table");
        assert_eq!(view.as_bytes(), value.as_bytes());
    }
    assert_eq!(loader.load_count(), 3);

    // Every key is now served from the shard.
    for (key, value) in [("Tom", "630"), ("Jack", "589"), ("Sam", "567")] {
        let view = group.get(key).await.expect("cached");
        assert_eq!(view.as_bytes(), value.as_bytes());
    }
    assert_eq!(loader.load_count(), 3);
    assert_eq!(group.stats().main_entries, 3);
}

#[tokio::test]
async fn test_loader_error_surfaces() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 2 << 10, loader.clone()).register_in(&Registry::new());

    let err = group.get("unknown").await.expect_err("key is absent");
    match err {
        CacheError::Loader(source) => {
            assert_eq!(source.to_string(), "unknown does not exist");
        }
        other => panic!("expected loader error, got {other:?}"),
    }

    // Failures are not cached; the loader is consulted again.
    let _ = group.get("unknown").await;
    assert_eq!(loader.load_count(), 2);
}

#[tokio::test]
async fn test_empty_key_rejected() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 2 << 10, loader.clone()).register_in(&Registry::new());

    assert!(matches!(group.get("").await, Err(CacheError::EmptyKey)));
    assert_eq!(loader.load_count(), 0);
}

#[test]
#[should_panic(expected = "already registered")]
fn test_duplicate_group_name_panics() {
    let registry = Registry::new();
    let loader = Arc::new(TableLoader::scores());
    let _ = GroupBuilder::new("dup", 0, loader.clone()).register_in(&registry);
    let _ = GroupBuilder::new("dup", 0, loader).register_in(&registry);
}

#[test]
#[should_panic(expected = "peers already registered")]
fn test_register_peers_twice_panics() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 0, loader).register_in(&Registry::new());

    let peer: Arc<dyn PeerClient> = Arc::new(FailingPeer);
    group.register_peers(Arc::new(StubPicker(peer.clone())));
    group.register_peers(Arc::new(StubPicker(peer)));
}

#[tokio::test]
async fn test_remote_hit_does_not_populate() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 2 << 10, loader.clone()).register_in(&Registry::new());
    let peer: Arc<dyn PeerClient> = Arc::new(StaticPeer(b"630"));
    group.register_peers(Arc::new(StubPicker(peer)));

    let view = group.get("Tom").await.expect("remote value");
    assert_eq!(view.as_bytes(), b"630");

    // The canonical copy stays at the owner.
    assert_eq!(loader.load_count(), 0);
    assert_eq!(group.stats().main_entries, 0);
    assert_eq!(group.stats().history_entries, 0);
}

#[tokio::test]
async fn test_remote_failure_falls_back_to_loader() {
    let loader = Arc::new(TableLoader::scores());
    let group = GroupBuilder::new("scores", 2 << 10, loader.clone()).register_in(&Registry::new());
    group.register_peers(Arc::new(StubPicker(Arc::new(FailingPeer))));

    let view = group.get("Tom").await.expect("loader fallback");
    assert_eq!(view.as_bytes(), b"630");
    assert_eq!(loader.load_count(), 1);
    assert_eq!(group.stats().main_entries, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_gets_coalesce() {
    let loads = Arc::new(AtomicUsize::new(0));
    let loader = {
        let loads = loads.clone();
        Arc::new(LoaderFn::new(move |_key: String| {
            let loads = loads.clone();
            async move {
                loads.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok::<_, BoxError>(b"630".to_vec())
            }
        }))
    };
    let group = GroupBuilder::new("scores", 2 << 10, loader).register_in(&Registry::new());

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let group = group.clone();
        tasks.push(tokio::spawn(async move { group.get("Tom").await }));
    }
    for task in tasks {
        let view = task.await.unwrap().expect("load succeeds");
        assert_eq!(view.as_bytes(), b"630");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_global_registry_round_trip() {
    let loader = Arc::new(TableLoader::scores());
    let group =
        GroupBuilder::new("global-registry-round-trip", 2 << 10, loader.clone()).register();

    let found = get_group("global-registry-round-trip").expect("registered globally");
    assert_eq!(found.name(), group.name());
    assert!(get_group("never-registered").is_none());
}
