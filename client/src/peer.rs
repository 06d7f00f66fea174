//! Client for a single remote peer.

use async_trait::async_trait;
use bytes::Bytes;
use meshcache::{BoxError, PeerClient};
use protocol_mesh::{decode_value, escape_segment};

use crate::error::FetchError;

/// HTTP client for one remote node, keyed by that node's base URL plus the
/// mesh base path (e.g. `http://host:8002/_mycache/`).
pub struct HttpPeer {
    base_url: String,
    http: reqwest::Client,
}

impl HttpPeer {
    /// Create a client for the peer at `base_url`. The `reqwest::Client` is
    /// shared across all peers of a pool so connections are reused.
    pub fn new(base_url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, group: &str, key: &str) -> Result<Bytes, FetchError> {
        let url = format!(
            "{}{}/{}",
            self.base_url,
            escape_segment(group),
            escape_segment(key)
        );
        tracing::debug!(url, "peer fetch");

        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(decode_value(&body)?)
    }
}

#[async_trait]
impl PeerClient for HttpPeer {
    async fn fetch(&self, group: &str, key: &str) -> Result<Bytes, BoxError> {
        Ok(self.get(group, key).await?)
    }
}
