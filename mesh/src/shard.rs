//! Mutex-guarded LRU-K shard owned by a group on a single node.

use lruk::LrukCache;
use parking_lot::Mutex;

use crate::byteview::ByteView;

/// Occupancy snapshot of a shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub main_entries: usize,
    pub main_bytes: usize,
    pub history_entries: usize,
    pub history_bytes: usize,
}

/// The node-local cache behind a group.
///
/// Wraps the LRU-K engine with a mutex so callers never worry about
/// serialization. The engine itself is allocated lazily on the first
/// insert, so a group that is only ever read through peers stays cheap.
pub struct CacheShard {
    max_bytes: usize,
    admission_threshold: u32,
    inner: Mutex<Option<LrukCache<ByteView>>>,
}

impl CacheShard {
    pub fn new(max_bytes: usize, admission_threshold: u32) -> Self {
        Self {
            max_bytes,
            admission_threshold,
            inner: Mutex::new(None),
        }
    }

    /// Look up a key. A shard that has never been written always misses.
    pub fn get(&self, key: &str) -> Option<ByteView> {
        let mut guard = self.inner.lock();
        guard.as_mut()?.get(key)
    }

    /// Insert or update a value, initializing the engine on first use.
    pub fn insert(&self, key: &str, value: ByteView) {
        let mut guard = self.inner.lock();
        let cache = guard
            .get_or_insert_with(|| LrukCache::new(self.max_bytes, self.admission_threshold));
        cache.insert(key, value);
    }

    pub fn stats(&self) -> CacheStats {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(cache) => CacheStats {
                main_entries: cache.main_len(),
                main_bytes: cache.main_bytes(),
                history_entries: cache.history_len(),
                history_bytes: cache.history_bytes(),
            },
            None => CacheStats::default(),
        }
    }
}
