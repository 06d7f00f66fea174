//! Meshcache node.
//!
//! Serves the peer cache protocol under the configured base path, an
//! optional `/api` front-end for external clients, and an optional admin
//! plane with health checks and Prometheus metrics.

pub mod admin;
pub mod banner;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod routes;
pub mod signal;
pub mod source;

pub use config::Config;

use std::sync::Arc;

use meshcache::{BoxError, GroupBuilder, Registry};
use meshcache_client::HttpPool;

use crate::source::TableSource;

/// Run a node until it is signalled to shut down.
pub fn run(config: Config) -> Result<(), BoxError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: Config) -> Result<(), BoxError> {
    let shutdown = signal::install();

    // Group, pool, and peer wiring. Registration order matters: the group
    // must exist before the first peer request arrives.
    let loader = Arc::new(TableSource::new(config.source.clone()));
    tracing::info!(entries = loader.len(), "source table ready");
    let group = GroupBuilder::new(config.group.name.as_str(), config.cache.max_bytes, loader)
        .admission_threshold(config.cache.admission_threshold)
        .register();
    let pool = Arc::new(
        HttpPool::new(config.node.self_url.as_str())
            .with_base_path(config.node.base_path.as_str())
            .with_replicas(config.cache.replicas),
    );
    pool.set_peers(&config.peers);
    group.register_peers(pool);

    let mut background = Vec::new();

    if config.admin.enabled {
        let app = admin::admin_router(shutdown.clone());
        let listener = tokio::net::TcpListener::bind(config.admin.listen).await?;
        tracing::info!(address = %config.admin.listen, "admin server listening");
        let shutdown = shutdown.clone();
        background.push(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.wait().await })
                .await
            {
                tracing::error!(error = %err, "admin server error");
            }
        }));
    }

    if config.api.enabled {
        let app = routes::api_router(group.clone());
        let listener = tokio::net::TcpListener::bind(config.api.listen).await?;
        tracing::info!(address = %config.api.listen, "api server listening");
        let shutdown = shutdown.clone();
        background.push(tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app)
                .with_graceful_shutdown(async move { shutdown.wait().await })
                .await
            {
                tracing::error!(error = %err, "api server error");
            }
        }));
    }

    let app = routes::peer_router(Registry::global().clone(), &config.node.base_path);
    let listener = tokio::net::TcpListener::bind(config.node.listen).await?;
    tracing::info!(
        address = %config.node.listen,
        node = %config.node.self_url,
        "cache server listening"
    );
    let waiter = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { waiter.wait().await })
        .await?;

    for task in background {
        let _ = task.await;
    }
    tracing::info!("server stopped");
    Ok(())
}
