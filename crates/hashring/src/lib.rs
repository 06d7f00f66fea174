//! Consistent hash ring with virtual nodes.
//!
//! Keys and nodes are hashed onto the same 32-bit ring. A key is owned by
//! the node whose virtual point is the first one clockwise from the key's
//! hash, wrapping around at the top of the ring. Each physical node is
//! inserted as `replicas` virtual points, which spreads ownership evenly
//! even when node hashes would otherwise cluster.
//!
//! The default hasher is CRC32/IEEE. Lookups are deterministic for a fixed
//! set of nodes, replica count, and hasher.

use ahash::AHashMap;

/// Hash function mapping bytes onto the ring.
pub type HashFn = Box<dyn Fn(&[u8]) -> u32 + Send + Sync>;

/// Recommended virtual points per node.
pub const DEFAULT_REPLICAS: usize = 50;

/// Consistent hash ring.
///
/// Immutable after [`Ring::add`]; adding nodes requires exclusive access.
pub struct Ring {
    replicas: usize,
    hasher: HashFn,
    // All virtual points, sorted ascending. Carries the canonical sequence;
    // `nodes` may lose a colliding point to overwrite, which is harmless
    // because the surviving entry still resolves the shared hash.
    points: Vec<u32>,
    nodes: AHashMap<u32, String>,
}

impl Ring {
    /// Create a ring with a custom hasher.
    ///
    /// # Panics
    ///
    /// Panics if `replicas` is zero.
    pub fn new(replicas: usize, hasher: HashFn) -> Self {
        assert!(replicas >= 1, "replicas must be at least 1");
        Self {
            replicas,
            hasher,
            points: Vec::new(),
            nodes: AHashMap::new(),
        }
    }

    /// Create a ring using the default CRC32/IEEE hasher.
    pub fn with_replicas(replicas: usize) -> Self {
        Self::new(replicas, Box::new(|data| crc32fast::hash(data)))
    }

    /// Insert nodes, creating `replicas` virtual points for each.
    ///
    /// Virtual point `i` of a node hashes the decimal form of `i`
    /// concatenated with the node id.
    pub fn add<I, S>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for node in nodes {
            let node = node.as_ref();
            for i in 0..self.replicas {
                let hash = (self.hasher)(format!("{i}{node}").as_bytes());
                self.points.push(hash);
                self.nodes.insert(hash, node.to_string());
            }
        }
        self.points.sort_unstable();
    }

    /// Owner of `key`: the node at the first virtual point at or after the
    /// key's hash, wrapping to the start of the ring.
    ///
    /// Returns `None` when the ring is empty.
    pub fn get(&self, key: &str) -> Option<&str> {
        if self.points.is_empty() {
            return None;
        }
        let hash = (self.hasher)(key.as_bytes());
        let idx = self.points.partition_point(|&point| point < hash) % self.points.len();
        self.nodes.get(&self.points[idx]).map(String::as_str)
    }

    /// True when no nodes have been added.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of virtual points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }
}

impl std::fmt::Debug for Ring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("replicas", &self.replicas)
            .field("points", &self.points.len())
            .finish()
    }
}
