//! Error kinds surfaced by cache lookups.

use std::sync::Arc;

use thiserror::Error;

/// Lookup failures.
///
/// `Clone` so a coalesced load can hand the same failure to every waiting
/// caller. Peer fetch failures never appear here: they are logged and
/// downgraded to a local loader attempt inside the group.
#[derive(Debug, Clone, Error)]
pub enum CacheError {
    /// An empty key was passed to a lookup.
    #[error("key must not be empty")]
    EmptyKey,

    /// A peer request referenced a group this process has not registered.
    #[error("no such group: {0}")]
    UnknownGroup(String),

    /// The backing loader failed; the underlying error is passed through.
    #[error("loader failed: {0}")]
    Loader(Arc<dyn std::error::Error + Send + Sync + 'static>),
}
