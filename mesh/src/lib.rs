//! Distributed LRU-K cache library.
//!
//! A [`Group`] is a named cache namespace. Every key is canonically owned by
//! exactly one node in the mesh; lookups on other nodes are forwarded to the
//! owner, and only the owner consults the backing [`Loader`] and populates
//! its local shard. Concurrent lookups for the same key collapse into a
//! single load.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshcache::{BoxError, Group, LoaderFn};
//!
//! # async fn example() -> Result<(), meshcache::CacheError> {
//! let group = Group::new(
//!     "scores",
//!     2 << 10,
//!     Arc::new(LoaderFn::new(|key: String| async move {
//!         Ok::<_, BoxError>(format!("value for {key}").into_bytes())
//!     })),
//! );
//!
//! let view = group.get("Tom").await?;
//! println!("{view}");
//! # Ok(())
//! # }
//! ```

pub mod byteview;
pub mod error;
pub mod group;
pub mod loader;
pub mod metrics;
pub mod peer;
pub mod shard;

pub use byteview::ByteView;
pub use error::CacheError;
pub use group::{Group, GroupBuilder, Registry, get_group};
pub use loader::{BoxError, Loader, LoaderFn};
pub use peer::{PeerClient, PeerPicker};
pub use shard::{CacheShard, CacheStats};
