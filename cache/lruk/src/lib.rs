//! Byte-bounded LRU-K cache with a FIFO admission queue.
//!
//! New entries land in a history queue and are only promoted into the main
//! cache once they have been observed K times. The history queue filters
//! one-hit wonders before they can displace established entries.
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                         LrukCache                            |
//! |                                                              |
//! |  +---------------------+        +------------------------+   |
//! |  | History (FIFO)      | -----> | Main (LRU)             |   |
//! |  | - observation count |  K     | - refresh on hit       |   |
//! |  | - evict from head   | seen   | - evict from LRU end   |   |
//! |  +---------------------+        +------------------------+   |
//! |        ^                                                     |
//! |        | new entries                                         |
//! +--------------------------------------------------------------+
//! ```
//!
//! Both queues are charged `key.len() + value.weight()` bytes against the
//! same capacity. A capacity of zero disables the limit. Entries observed
//! again while in history move to the tail of the FIFO, which protects
//! active keys from premature eviction without bypassing the K-observation
//! requirement.
//!
//! The cache is not safe for concurrent use; callers serialize access.

use hashlink::LinkedHashMap;

/// Types that can report their resident size in bytes.
pub trait Weight {
    /// Size of the value in bytes, as charged against the cache capacity.
    fn weight(&self) -> usize;
}

impl Weight for String {
    fn weight(&self) -> usize {
        self.len()
    }
}

impl Weight for Vec<u8> {
    fn weight(&self) -> usize {
        self.len()
    }
}

/// Callback invoked with entries removed by capacity pressure.
///
/// Not invoked for in-place updates or for promotion between queues.
pub type EvictionCallback<V> = Box<dyn FnMut(String, V) + Send>;

/// Which queue a key currently resides in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// Fully admitted, LRU-ordered.
    Main,
    /// Awaiting K observations, FIFO-ordered.
    History,
}

struct HistoryEntry<V> {
    value: V,
    count: u32,
}

/// Byte-bounded two-queue LRU-K cache.
pub struct LrukCache<V> {
    max_bytes: usize,
    k: u32,
    // back = most recently used, front = eviction candidate
    main: LinkedHashMap<String, V>,
    // back = newest, front = FIFO eviction candidate
    history: LinkedHashMap<String, HistoryEntry<V>>,
    used_main: usize,
    used_history: usize,
    on_evict: Option<EvictionCallback<V>>,
}

impl<V: Weight + Clone> LrukCache<V> {
    /// Create a cache with the given byte capacity and admission threshold.
    ///
    /// `max_bytes` applies independently to the history queue and the main
    /// cache; zero disables the limit. `k` is the number of observations
    /// required before an entry is promoted into the main cache.
    ///
    /// # Panics
    ///
    /// Panics if `k` is zero.
    pub fn new(max_bytes: usize, k: u32) -> Self {
        assert!(k >= 1, "admission threshold must be at least 1");
        Self {
            max_bytes,
            k,
            main: LinkedHashMap::new(),
            history: LinkedHashMap::new(),
            used_main: 0,
            used_history: 0,
            on_evict: None,
        }
    }

    /// Create a cache that reports capacity evictions through `on_evict`.
    pub fn with_eviction_callback(max_bytes: usize, k: u32, on_evict: EvictionCallback<V>) -> Self {
        let mut cache = Self::new(max_bytes, k);
        cache.on_evict = Some(on_evict);
        cache
    }

    /// Look up a key, counting the access as an observation.
    ///
    /// A main-cache hit refreshes the entry to the MRU position. A history
    /// hit increments the observation count, promotes the entry once the
    /// count reaches K, and otherwise refreshes its FIFO position. Both
    /// count as hits.
    pub fn get(&mut self, key: &str) -> Option<V> {
        if let Some(value) = self.refresh_main(key) {
            return Some(value);
        }
        self.observe_history(key)
    }

    /// Insert or update an entry.
    ///
    /// Updating a key in the main cache replaces the value at the MRU
    /// position. Updating a key in history replaces the value, counts an
    /// observation, and refreshes its FIFO position. New keys enter the
    /// history queue with a count of one. Promotion happens whenever the
    /// count reaches K, and both queues are swept back under capacity
    /// before returning.
    pub fn insert(&mut self, key: &str, value: V) {
        if self.main.contains_key(key) {
            self.update_main(key, value);
            return;
        }
        if self.history.contains_key(key) {
            self.update_history(key, value);
            return;
        }

        // New key: admit through history.
        self.used_history += key.len() + value.weight();
        self.history
            .insert(key.to_string(), HistoryEntry { value, count: 1 });
        if 1 >= self.k {
            self.promote(key);
        } else {
            self.sweep_history();
        }
    }

    /// Which queue holds `key`, if any.
    pub fn locate(&self, key: &str) -> Option<Location> {
        if self.main.contains_key(key) {
            Some(Location::Main)
        } else if self.history.contains_key(key) {
            Some(Location::History)
        } else {
            None
        }
    }

    /// Observation count for a key still in the history queue.
    ///
    /// Returns `None` for keys in the main cache or absent entirely.
    pub fn observations(&self, key: &str) -> Option<u32> {
        self.history.get(key).map(|entry| entry.count)
    }

    /// Number of entries in the main cache.
    pub fn main_len(&self) -> usize {
        self.main.len()
    }

    /// Number of entries in the history queue.
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Bytes charged to the main cache.
    pub fn main_bytes(&self) -> usize {
        self.used_main
    }

    /// Bytes charged to the history queue.
    pub fn history_bytes(&self) -> usize {
        self.used_history
    }

    /// Byte capacity applied to each queue; zero means unbounded.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Move a main-cache entry to the MRU position and return its value.
    fn refresh_main(&mut self, key: &str) -> Option<V> {
        let value = self.main.remove(key)?;
        self.main.insert(key.to_string(), value.clone());
        Some(value)
    }

    /// Count an observation for a history entry, promoting it once the
    /// count reaches K and refreshing its FIFO position otherwise.
    fn observe_history(&mut self, key: &str) -> Option<V> {
        let mut entry = self.history.remove(key)?;
        entry.count += 1;
        let value = entry.value.clone();
        if entry.count >= self.k {
            self.used_history -= key.len() + entry.value.weight();
            self.admit(key, entry.value);
        } else {
            self.history.insert(key.to_string(), entry);
        }
        Some(value)
    }

    fn update_main(&mut self, key: &str, value: V) {
        let Some(old) = self.main.remove(key) else {
            return;
        };
        // Take the delta before the old value is dropped; the key stays, so
        // only the value weights differ.
        self.used_main -= old.weight();
        self.used_main += value.weight();
        self.main.insert(key.to_string(), value);
        self.sweep_main();
    }

    fn update_history(&mut self, key: &str, value: V) {
        let Some(mut entry) = self.history.remove(key) else {
            return;
        };
        self.used_history -= entry.value.weight();
        self.used_history += value.weight();
        entry.value = value;
        entry.count += 1;
        if entry.count >= self.k {
            self.used_history -= key.len() + entry.value.weight();
            self.admit(key, entry.value);
        } else {
            self.history.insert(key.to_string(), entry);
            self.sweep_history();
        }
    }

    /// Move a history entry into the main cache, discarding its count.
    fn promote(&mut self, key: &str) {
        if let Some(entry) = self.history.remove(key) {
            self.used_history -= key.len() + entry.value.weight();
            self.admit(key, entry.value);
        }
    }

    /// Insert a value at the MRU position of the main cache and sweep it
    /// back under capacity.
    fn admit(&mut self, key: &str, value: V) {
        self.used_main += key.len() + value.weight();
        self.main.insert(key.to_string(), value);
        self.sweep_main();
    }

    fn sweep_main(&mut self) {
        while self.max_bytes != 0 && self.used_main > self.max_bytes {
            let Some((key, value)) = self.main.pop_front() else {
                break;
            };
            self.used_main -= key.len() + value.weight();
            if let Some(on_evict) = self.on_evict.as_mut() {
                on_evict(key, value);
            }
        }
    }

    fn sweep_history(&mut self) {
        while self.max_bytes != 0 && self.used_history > self.max_bytes {
            let Some((key, entry)) = self.history.pop_front() else {
                break;
            };
            self.used_history -= key.len() + entry.value.weight();
            if let Some(on_evict) = self.on_evict.as_mut() {
                on_evict(key, entry.value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::Mutex;

    fn weight_of(key: &str, value: &str) -> usize {
        key.len() + value.len()
    }

    #[test]
    fn test_miss_on_empty() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 2);
        assert!(cache.get("absent").is_none());
        assert!(cache.locate("absent").is_none());
    }

    #[test]
    fn test_promotion_after_k_observations() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 2);

        cache.insert("a", "1".to_string());
        assert_eq!(cache.locate("a"), Some(Location::History));
        assert_eq!(cache.observations("a"), Some(1));

        // Second observation promotes into main.
        assert_eq!(cache.get("a"), Some("1".to_string()));
        assert_eq!(cache.locate("a"), Some(Location::Main));
        assert_eq!(cache.observations("a"), None);

        cache.insert("b", "2".to_string());
        assert_eq!(cache.locate("b"), Some(Location::History));
        assert_eq!(cache.observations("b"), Some(1));

        // History lookups still count as hits.
        assert_eq!(cache.get("b"), Some("2".to_string()));
        assert_eq!(cache.locate("b"), Some(Location::Main));
    }

    #[test]
    fn test_history_fifo_eviction_with_refresh() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let cap = weight_of("k1", "v1") + weight_of("k2", "v2");
        let mut cache: LrukCache<String> = LrukCache::with_eviction_callback(
            cap,
            3,
            Box::new(move |key, value| sink.lock().unwrap().push((key, value))),
        );

        cache.insert("k1", "v1".to_string());
        cache.insert("k2", "v2".to_string());
        cache.insert("k3", "v3".to_string());

        // FIFO head goes first.
        assert!(cache.locate("k1").is_none());
        assert_eq!(cache.locate("k2"), Some(Location::History));
        assert_eq!(cache.locate("k3"), Some(Location::History));
        assert_eq!(
            evicted.lock().unwrap().as_slice(),
            &[("k1".to_string(), "v1".to_string())]
        );
        assert_eq!(cache.history_bytes(), cap);
    }

    #[test]
    fn test_history_refresh_protects_active_keys() {
        let cap = weight_of("k1", "v1") + weight_of("k2", "v2");
        let mut cache: LrukCache<String> = LrukCache::new(cap, 3);

        cache.insert("k1", "v1".to_string());
        cache.insert("k2", "v2".to_string());
        // Observing k1 moves it to the FIFO tail.
        assert_eq!(cache.get("k1"), Some("v1".to_string()));
        cache.insert("k3", "v3".to_string());

        // k2 is now the head and is evicted instead of k1.
        assert_eq!(cache.locate("k1"), Some(Location::History));
        assert!(cache.locate("k2").is_none());
    }

    #[test]
    fn test_main_lru_eviction() {
        let cap = weight_of("k1", "v1") + weight_of("k2", "v2");

        // Without an intervening access, k1 is the LRU entry.
        let mut cache: LrukCache<String> = LrukCache::new(cap, 1);
        cache.insert("k1", "v1".to_string());
        cache.insert("k2", "v2".to_string());
        cache.insert("k3", "v3".to_string());
        assert!(cache.locate("k1").is_none());
        assert_eq!(cache.locate("k2"), Some(Location::Main));
        assert_eq!(cache.locate("k3"), Some(Location::Main));

        // A hit on k1 makes k2 the eviction candidate.
        let mut cache: LrukCache<String> = LrukCache::new(cap, 1);
        cache.insert("k1", "v1".to_string());
        cache.insert("k2", "v2".to_string());
        assert_eq!(cache.get("k1"), Some("v1".to_string()));
        cache.insert("k3", "v3".to_string());
        assert_eq!(cache.locate("k1"), Some(Location::Main));
        assert!(cache.locate("k2").is_none());
        assert_eq!(cache.locate("k3"), Some(Location::Main));
    }

    #[test]
    fn test_k1_promotes_immediately() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 1);
        cache.insert("key1", "1234".to_string());
        assert_eq!(cache.locate("key1"), Some(Location::Main));
        assert_eq!(cache.get("key1"), Some("1234".to_string()));
        assert!(cache.get("key2").is_none());
    }

    #[test]
    fn test_eviction_callback_order() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let mut cache: LrukCache<String> = LrukCache::with_eviction_callback(
            20,
            1,
            Box::new(move |key, _value| sink.lock().unwrap().push(key)),
        );

        cache.insert("key1", "nihao".to_string());
        cache.insert("key2", "nihuai".to_string());
        cache.insert("key3", "nichou".to_string());
        cache.insert("key4", "nicai".to_string());

        assert_eq!(
            evicted.lock().unwrap().as_slice(),
            &["key1".to_string(), "key2".to_string()]
        );
    }

    #[test]
    fn test_update_in_place_adjusts_bytes() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 1);
        cache.insert("k", "ab".to_string());
        assert_eq!(cache.main_bytes(), 3);

        // Growing update.
        cache.insert("k", "abcd".to_string());
        assert_eq!(cache.main_bytes(), 5);
        assert_eq!(cache.main_len(), 1);

        // Shrinking update.
        cache.insert("k", "a".to_string());
        assert_eq!(cache.main_bytes(), 2);
        assert_eq!(cache.get("k"), Some("a".to_string()));
    }

    #[test]
    fn test_update_refreshes_mru_position() {
        let cap = weight_of("k1", "v1") + weight_of("k2", "v2");
        let mut cache: LrukCache<String> = LrukCache::new(cap, 1);
        cache.insert("k1", "v1".to_string());
        cache.insert("k2", "v2".to_string());
        // Rewriting k1 moves it to the MRU position.
        cache.insert("k1", "x1".to_string());
        cache.insert("k3", "v3".to_string());
        assert_eq!(cache.locate("k1"), Some(Location::Main));
        assert!(cache.locate("k2").is_none());
    }

    #[test]
    fn test_history_update_counts_observation() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 3);
        cache.insert("k", "v1".to_string());
        cache.insert("k", "v2".to_string());
        assert_eq!(cache.observations("k"), Some(2));
        assert_eq!(cache.locate("k"), Some(Location::History));

        // Third observation promotes with the latest value.
        cache.insert("k", "v3".to_string());
        assert_eq!(cache.locate("k"), Some(Location::Main));
        assert_eq!(cache.get("k"), Some("v3".to_string()));
        assert_eq!(cache.history_bytes(), 0);
    }

    #[test]
    fn test_oversized_entry_is_not_retained() {
        let evicted = Arc::new(Mutex::new(Vec::new()));
        let sink = evicted.clone();
        let mut cache: LrukCache<String> = LrukCache::with_eviction_callback(
            4,
            1,
            Box::new(move |key, _value| sink.lock().unwrap().push(key)),
        );

        cache.insert("big", "value-too-large".to_string());
        assert!(cache.locate("big").is_none());
        assert_eq!(cache.main_bytes(), 0);
        assert_eq!(evicted.lock().unwrap().as_slice(), &["big".to_string()]);
    }

    #[test]
    fn test_capacity_invariant_holds_after_every_operation() {
        let cap = 32;
        let mut cache: LrukCache<String> = LrukCache::new(cap, 2);

        for i in 0..64 {
            let key = format!("key-{i}");
            let value = format!("value-{i}");
            cache.insert(&key, value.clone());
            assert!(cache.history_bytes() <= cap);
            assert!(cache.main_bytes() <= cap);

            cache.get(&key);
            assert!(cache.history_bytes() <= cap);
            assert!(cache.main_bytes() <= cap);

            // A key never appears in both queues at once.
            let in_main = cache.main.contains_key(&key);
            let in_history = cache.history.contains_key(&key);
            assert!(!(in_main && in_history));
        }
    }

    #[test]
    fn test_unbounded_when_capacity_is_zero() {
        let mut cache: LrukCache<String> = LrukCache::new(0, 1);
        for i in 0..256 {
            cache.insert(&format!("key-{i}"), "x".repeat(64));
        }
        assert_eq!(cache.main_len(), 256);
    }

    #[test]
    #[should_panic(expected = "admission threshold")]
    fn test_zero_threshold_panics() {
        let _ = LrukCache::<String>::new(0, 0);
    }
}
