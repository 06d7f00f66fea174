//! Signal handling for graceful shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Shared shutdown state.
///
/// Cloneable; all clones observe the same trigger. Async servers wait on
/// [`Shutdown::wait`], synchronous code polls [`Shutdown::is_shutdown`].
#[derive(Clone)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            tx: Arc::new(tx),
        }
    }

    /// Begin shutdown, waking every waiter.
    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _ = self.tx.send(true);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Resolve once shutdown has been triggered.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        let _ = rx.wait_for(|stopping| *stopping).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Install SIGINT/SIGTERM handlers and return the shutdown handle they
/// trigger. A second signal forces an immediate exit.
pub fn install() -> Shutdown {
    let shutdown = Shutdown::new();
    let handler = shutdown.clone();

    ctrlc::set_handler(move || {
        if handler.flag.swap(true, Ordering::SeqCst) {
            tracing::warn!("received second signal, forcing immediate exit");
            std::process::exit(1);
        }
        tracing::info!("received shutdown signal, draining");
        let _ = handler.tx.send(true);
    })
    .expect("failed to install signal handler");

    shutdown
}
