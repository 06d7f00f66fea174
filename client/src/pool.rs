//! Peer pool: the hash ring plus one client per sibling node.

use std::sync::Arc;

use ahash::AHashMap;
use hashring::{DEFAULT_REPLICAS, Ring};
use meshcache::{PeerClient, PeerPicker};
use parking_lot::Mutex;

/// Path prefix every node serves the peer protocol under.
pub const DEFAULT_BASE_PATH: &str = "/_mycache/";

use crate::peer::HttpPeer;

struct PoolState {
    ring: Ring,
    peers: AHashMap<String, Arc<HttpPeer>>,
}

/// Owner selection and per-peer clients for one node of the mesh.
///
/// The pool knows its own node id (the full base URL peers use to address
/// it) so it can tell self-owned keys apart from remote ones. Peers are set
/// once at startup; the ring and the client map are only ever swapped
/// wholesale under the pool lock.
pub struct HttpPool {
    self_url: String,
    base_path: String,
    replicas: usize,
    state: Mutex<PoolState>,
}

impl HttpPool {
    /// Create a pool for the node addressed as `self_url`
    /// (e.g. `http://127.0.0.1:8001`), with the default base path and
    /// replica count.
    pub fn new(self_url: impl Into<String>) -> Self {
        let replicas = DEFAULT_REPLICAS;
        Self {
            self_url: self_url.into(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            replicas,
            state: Mutex::new(PoolState {
                ring: Ring::with_replicas(replicas),
                peers: AHashMap::new(),
            }),
        }
    }

    /// Serve and address the peer protocol under a different path prefix.
    /// Every node of a mesh must agree on it.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    /// Override the number of virtual points per node on the ring.
    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self.state.get_mut().ring = Ring::with_replicas(replicas);
        self
    }

    /// Set the nodes of the mesh, rebuilding the ring and the client map.
    ///
    /// `peers` are full base URLs and should include this node itself so
    /// that ownership is spread over every member.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let peers: Vec<String> = peers.into_iter().map(|p| p.as_ref().to_string()).collect();

        let mut ring = Ring::with_replicas(self.replicas);
        ring.add(peers.iter());

        let http = reqwest::Client::new();
        let clients = peers
            .into_iter()
            .map(|peer| {
                let base_url = format!("{}{}", peer, self.base_path);
                (peer, Arc::new(HttpPeer::new(base_url, http.clone())))
            })
            .collect();

        let mut state = self.state.lock();
        state.ring = ring;
        state.peers = clients;
    }

    pub fn self_url(&self) -> &str {
        &self.self_url
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl PeerPicker for HttpPool {
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>> {
        let state = self.state.lock();
        let owner = state.ring.get(key)?;
        if owner == self.self_url {
            return None;
        }
        let peer = state.peers.get(owner)?.clone();
        tracing::debug!(node = %self.self_url, owner, key, "picked peer");
        Some(peer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_picks_nobody() {
        let pool = HttpPool::new("http://127.0.0.1:8001");
        assert!(pool.pick_peer("Tom").is_none());
    }

    #[test]
    fn test_single_node_owns_everything() {
        let pool = HttpPool::new("http://127.0.0.1:8001");
        pool.set_peers(["http://127.0.0.1:8001"]);
        for key in ["Tom", "Jack", "Sam"] {
            assert!(pool.pick_peer(key).is_none(), "self-owned key {key}");
        }
    }

    #[test]
    fn test_picks_follow_the_ring() {
        let nodes = [
            "http://127.0.0.1:8001",
            "http://127.0.0.1:8002",
            "http://127.0.0.1:8003",
        ];
        let pool = HttpPool::new(nodes[0]);
        pool.set_peers(nodes);

        let mut ring = Ring::with_replicas(DEFAULT_REPLICAS);
        ring.add(nodes);

        for i in 0..256 {
            let key = format!("key-{i}");
            let owner = ring.get(&key).unwrap();
            match pool.pick_peer(&key) {
                None => assert_eq!(owner, nodes[0], "self-owned key {key}"),
                Some(_) => assert_ne!(owner, nodes[0], "remote key {key}"),
            }
        }
    }

    #[test]
    fn test_base_path_lands_in_client_urls() {
        let pool = HttpPool::new("http://127.0.0.1:8001").with_base_path("/_cache/");
        assert_eq!(pool.base_path(), "/_cache/");
        pool.set_peers(["http://127.0.0.1:8001", "http://127.0.0.1:8002"]);

        let state = pool.state.lock();
        let peer = state.peers.get("http://127.0.0.1:8002").unwrap();
        assert_eq!(peer.base_url(), "http://127.0.0.1:8002/_cache/");
    }
}
