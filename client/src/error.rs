//! Peer fetch failures.

use protocol_mesh::WireError;
use thiserror::Error;

/// Why a fetch from a remote owner failed.
///
/// All variants are downgraded to a local loader attempt by the group; they
/// exist to make logs actionable.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, DNS, or I/O failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a non-200 status.
    #[error("peer returned HTTP {0}")]
    Status(u16),

    /// The peer answered 200 with a body that does not decode.
    #[error("invalid response body: {0}")]
    Decode(#[from] WireError),
}
