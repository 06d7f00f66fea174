//! Seams between a group and the rest of the mesh.
//!
//! The group holds a picker; the picker holds per-peer clients but never a
//! group, which keeps the ownership graph acyclic.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::loader::BoxError;

/// Client for a single remote peer.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Fetch the value for `(group, key)` from the peer.
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, BoxError>;
}

/// Selects the peer that owns a key.
pub trait PeerPicker: Send + Sync {
    /// Client for the owner of `key`.
    ///
    /// Returns `None` when no peers are configured, when this node is the
    /// owner, or when no client is registered for the owner.
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>>;
}
