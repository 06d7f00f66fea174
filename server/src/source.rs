//! Static key/value source backing the bundled loader.
//!
//! Stands in for the authoritative store behind the cache. Entries come
//! from the `[source]` section of the config file, so a node is complete
//! without user code; embedders supply their own [`Loader`] instead.

use std::collections::HashMap;

use async_trait::async_trait;
use meshcache::{BoxError, Loader};

/// Loader over a fixed in-memory table.
pub struct TableSource {
    entries: HashMap<String, String>,
}

impl TableSource {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Loader for TableSource {
    async fn load(&self, key: &str) -> Result<Vec<u8>, BoxError> {
        tracing::info!(key, "source lookup");
        match self.entries.get(key) {
            Some(value) => Ok(value.clone().into_bytes()),
            None => Err(format!("{key} does not exist in the source table").into()),
        }
    }
}
