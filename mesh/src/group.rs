//! Group coordination: local lookup, peer selection, loading, population.

use std::sync::{Arc, LazyLock, OnceLock};

use ahash::AHashMap;
use parking_lot::RwLock;
use singleflight::SingleFlight;

use crate::byteview::ByteView;
use crate::error::CacheError;
use crate::loader::Loader;
use crate::metrics;
use crate::peer::{PeerClient, PeerPicker};
use crate::shard::{CacheShard, CacheStats};

/// Registry of groups by name.
///
/// Registration happens once per group at startup; lookups are the common
/// case, so the map sits behind a read-preferring lock. The process-global
/// registry backs [`Group::new`] and [`get_group`]; separate registries can
/// be created for tests or for embedding several nodes in one process.
#[derive(Clone, Default)]
pub struct Registry {
    groups: Arc<RwLock<AHashMap<String, Arc<Group>>>>,
}

static GLOBAL: LazyLock<Registry> = LazyLock::new(Registry::new);

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-global registry.
    pub fn global() -> &'static Registry {
        &GLOBAL
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    fn register(&self, group: Group) -> Arc<Group> {
        let mut groups = self.groups.write();
        if groups.contains_key(&group.name) {
            panic!("group '{}' is already registered", group.name);
        }
        let group = Arc::new(group);
        groups.insert(group.name.clone(), group.clone());
        group
    }
}

/// Look up a group in the process-global registry.
pub fn get_group(name: &str) -> Option<Arc<Group>> {
    Registry::global().get(name)
}

/// Builder for [`Group`].
pub struct GroupBuilder {
    name: String,
    cache_bytes: usize,
    admission_threshold: u32,
    loader: Arc<dyn Loader>,
}

impl GroupBuilder {
    pub fn new(name: impl Into<String>, cache_bytes: usize, loader: Arc<dyn Loader>) -> Self {
        Self {
            name: name.into(),
            cache_bytes,
            admission_threshold: 1,
            loader,
        }
    }

    /// Observations required before the shard admits an entry into its main
    /// cache (K). Defaults to 1.
    pub fn admission_threshold(mut self, k: u32) -> Self {
        self.admission_threshold = k;
        self
    }

    /// Register in the process-global registry.
    ///
    /// # Panics
    ///
    /// Panics if a group with the same name already exists; two groups
    /// silently sharing a name would split their cache state.
    pub fn register(self) -> Arc<Group> {
        self.register_in(Registry::global())
    }

    /// Register in a specific registry.
    pub fn register_in(self, registry: &Registry) -> Arc<Group> {
        registry.register(Group {
            shard: CacheShard::new(self.cache_bytes, self.admission_threshold),
            name: self.name,
            loader: self.loader,
            peers: OnceLock::new(),
            flight: SingleFlight::new(),
        })
    }
}

/// A named cache namespace.
///
/// Owns the node-local shard and drives the full lookup path: local probe,
/// owner selection, remote fetch, loader invocation, and population. All of
/// that happens behind [`Group::get`]; callers only ever see a [`ByteView`].
pub struct Group {
    name: String,
    loader: Arc<dyn Loader>,
    shard: CacheShard,
    peers: OnceLock<Arc<dyn PeerPicker>>,
    flight: SingleFlight<Result<ByteView, CacheError>>,
}

impl Group {
    /// Create a group with the default admission threshold and register it
    /// in the process-global registry.
    pub fn new(name: impl Into<String>, cache_bytes: usize, loader: Arc<dyn Loader>) -> Arc<Group> {
        GroupBuilder::new(name, cache_bytes, loader).register()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inject the peer picker. Must be called at most once.
    ///
    /// # Panics
    ///
    /// Panics on a second call; swapping pickers underneath in-flight
    /// lookups is not supported.
    pub fn register_peers(&self, peers: Arc<dyn PeerPicker>) {
        if self.peers.set(peers).is_err() {
            panic!("peers already registered for group '{}'", self.name);
        }
    }

    /// Look up a key.
    ///
    /// Serves from the local shard when possible. On a miss, concurrent
    /// lookups for the same key coalesce into one load, which fetches from
    /// the owning peer when one exists and otherwise consults the loader
    /// and populates the local shard. A failed peer fetch is logged and
    /// downgraded to a loader attempt; loader failures surface unchanged.
    pub async fn get(&self, key: &str) -> Result<ByteView, CacheError> {
        if key.is_empty() {
            return Err(CacheError::EmptyKey);
        }

        if let Some(view) = self.shard.get(key) {
            metrics::HITS.increment();
            tracing::debug!(group = %self.name, key, "cache hit");
            return Ok(view);
        }
        metrics::MISSES.increment();

        self.flight.run(key, || self.load(key)).await
    }

    /// Occupancy of the local shard.
    pub fn stats(&self) -> CacheStats {
        self.shard.stats()
    }

    async fn load(&self, key: &str) -> Result<ByteView, CacheError> {
        if let Some(picker) = self.peers.get()
            && let Some(peer) = picker.pick_peer(key)
        {
            match self.fetch_from_peer(peer.as_ref(), key).await {
                Ok(view) => return Ok(view),
                Err(err) => {
                    metrics::PEER_FETCH_ERRORS.increment();
                    tracing::warn!(
                        group = %self.name,
                        key,
                        error = %err,
                        "peer fetch failed, falling back to loader"
                    );
                }
            }
        }
        self.load_locally(key).await
    }

    async fn fetch_from_peer(
        &self,
        peer: &dyn PeerClient,
        key: &str,
    ) -> Result<ByteView, crate::loader::BoxError> {
        metrics::PEER_FETCHES.increment();
        let bytes = peer.fetch(&self.name, key).await?;
        // The owner keeps the canonical copy; the local shard is not
        // populated on a remote hit.
        Ok(ByteView::from(bytes))
    }

    async fn load_locally(&self, key: &str) -> Result<ByteView, CacheError> {
        metrics::LOADS.increment();
        let bytes = self.loader.load(key).await.map_err(|err| {
            metrics::LOAD_ERRORS.increment();
            CacheError::Loader(Arc::from(err))
        })?;

        let view = ByteView::from(bytes);
        self.shard.insert(key, view.clone());
        tracing::debug!(group = %self.name, key, "loaded from source and populated");
        Ok(view)
    }
}
