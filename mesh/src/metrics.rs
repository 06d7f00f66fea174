//! Cache lookup metrics.

use metriken::{Counter, metric};

#[metric(
    name = "cache_hits",
    description = "Lookups served from the local shard"
)]
pub static HITS: Counter = Counter::new();

#[metric(
    name = "cache_misses",
    description = "Lookups that missed the local shard"
)]
pub static MISSES: Counter = Counter::new();

#[metric(name = "cache_loads", description = "Loader invocations")]
pub static LOADS: Counter = Counter::new();

#[metric(name = "cache_load_errors", description = "Loader failures")]
pub static LOAD_ERRORS: Counter = Counter::new();

#[metric(
    name = "peer_fetches",
    description = "Lookups forwarded to the owning peer"
)]
pub static PEER_FETCHES: Counter = Counter::new();

#[metric(
    name = "peer_fetch_errors",
    description = "Forwarded lookups that failed and fell back to the loader"
)]
pub static PEER_FETCH_ERRORS: Counter = Counter::new();
