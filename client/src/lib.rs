//! HTTP peer client and picker for the cache mesh.
//!
//! An [`HttpPool`] holds one [`HttpPeer`] per sibling node plus the
//! consistent hash ring that decides which node owns each key. A group with
//! a registered pool forwards misses to the owner over
//! `GET {peer}{base_path}{group}/{key}` and decodes the enveloped response.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshcache_client::HttpPool;
//!
//! let pool = Arc::new(HttpPool::new("http://127.0.0.1:8001"));
//! pool.set_peers([
//!     "http://127.0.0.1:8001",
//!     "http://127.0.0.1:8002",
//!     "http://127.0.0.1:8003",
//! ]);
//! // group.register_peers(pool);
//! ```

mod error;
mod peer;
mod pool;

pub use error::FetchError;
pub use peer::HttpPeer;
pub use pool::{DEFAULT_BASE_PATH, HttpPool};
