//! Per-key coalescing of concurrent async loads.
//!
//! When several tasks request the same key at the same time, exactly one of
//! them (the leader) runs the load; the rest wait on the leader's result and
//! receive a clone of it. An entry lives in the flight map only while its
//! load is in flight: once the leader finishes, the entry is removed and a
//! later call pays a fresh execution. Coalescing therefore never serves
//! stale results; freshness stays under the control of the surrounding
//! cache layer.
//!
//! The map lock is synchronous and is never held across an await point.

use std::future::Future;

use ahash::AHashMap;
use parking_lot::Mutex;
use tokio::sync::watch;

/// Coalesces concurrent executions of a keyed async operation.
///
/// `T` must be `Clone` so followers can share the leader's result; wrap
/// expensive payloads in `Arc` or use cheaply-cloneable types.
pub struct SingleFlight<T> {
    flights: Mutex<AHashMap<String, watch::Receiver<Option<T>>>>,
}

impl<T: Clone> SingleFlight<T> {
    pub fn new() -> Self {
        Self {
            flights: Mutex::new(AHashMap::new()),
        }
    }

    /// Run `work` for `key`, or wait for an in-flight execution to finish.
    ///
    /// For any set of overlapping calls with the same key, the work future
    /// is built and run at most once; every caller receives the same result.
    /// If a leader is cancelled before publishing, one of the waiting
    /// followers takes over and runs its own work future.
    pub async fn run<F, Fut>(&self, key: &str, work: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        enum Role<T> {
            Leader(watch::Sender<Option<T>>),
            Follower(watch::Receiver<Option<T>>),
        }

        let mut work = Some(work);
        loop {
            // The map lock is confined to this block; no await runs under it.
            let role = {
                let mut flights = self.flights.lock();
                match flights.get(key) {
                    Some(rx) => Role::Follower(rx.clone()),
                    None => {
                        let (tx, rx) = watch::channel(None);
                        flights.insert(key.to_string(), rx);
                        Role::Leader(tx)
                    }
                }
            };

            match role {
                Role::Leader(tx) => {
                    let result = (work.take().expect("leader runs once"))().await;
                    let _ = tx.send(Some(result.clone()));
                    self.flights.lock().remove(key);
                    return result;
                }
                Role::Follower(mut rx) => {
                    let published = match rx.wait_for(Option::is_some).await {
                        Ok(value) => {
                            Some(value.as_ref().expect("wait_for guarantees Some").clone())
                        }
                        Err(_) => None,
                    };
                    match published {
                        Some(value) => return value,
                        None => {
                            // The leader was dropped without publishing. Clear
                            // the dead entry (unless a new leader already
                            // replaced it) and contend for leadership.
                            let mut flights = self.flights.lock();
                            if flights
                                .get(key)
                                .is_some_and(|current| current.same_channel(&rx))
                            {
                                flights.remove(key);
                            }
                        }
                    }
                }
            }
        }
    }

    /// Number of keys currently in flight.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }
}

impl<T: Clone> Default for SingleFlight<T> {
    fn default() -> Self {
        Self::new()
    }
}
