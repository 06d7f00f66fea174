//! Node request metrics.
//!
//! Cache-level counters (hits, misses, loads, peer fetches) live in the
//! meshcache library; these cover the HTTP surface of the node.

use metriken::{Counter, metric};

#[metric(
    name = "peer_requests",
    description = "Peer protocol requests received"
)]
pub static PEER_REQUESTS: Counter = Counter::new();

#[metric(
    name = "peer_request_errors",
    description = "Peer protocol requests answered with an error status"
)]
pub static PEER_REQUEST_ERRORS: Counter = Counter::new();

#[metric(name = "api_requests", description = "API front-end requests received")]
pub static API_REQUESTS: Counter = Counter::new();

#[metric(
    name = "api_request_errors",
    description = "API front-end requests answered with an error status"
)]
pub static API_REQUEST_ERRORS: Counter = Counter::new();
