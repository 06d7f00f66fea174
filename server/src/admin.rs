//! Admin plane: health checks and metrics exposition.
//!
//! - `GET /health` - liveness probe, always 200
//! - `GET /ready` - readiness probe, 503 once shutdown begins
//! - `GET /metrics` - Prometheus-formatted metrics

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;

use crate::signal::Shutdown;

/// Build the admin router.
pub fn admin_router(shutdown: Shutdown) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route(
            "/ready",
            get(move || {
                let shutdown = shutdown.clone();
                async move { ready_handler(shutdown) }
            }),
        )
        .route("/metrics", get(metrics_handler))
}

async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

fn ready_handler(shutdown: Shutdown) -> impl IntoResponse {
    if shutdown.is_shutdown() {
        (StatusCode::SERVICE_UNAVAILABLE, "Shutting down")
    } else {
        (StatusCode::OK, "OK")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("Content-Type", "text/plain; version=0.0.4; charset=utf-8")],
        prometheus_output(),
    )
}

/// Render all registered metrics in Prometheus text format.
fn prometheus_output() -> String {
    let mut output = String::with_capacity(2048);

    for metric in metriken::metrics().iter() {
        let name = metric.name();
        if name.is_empty() {
            continue;
        }
        let Some(value) = metric.value() else {
            continue;
        };

        let prom_name: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        match value {
            metriken::Value::Counter(v) => {
                output.push_str(&format!("# TYPE {prom_name} counter\n"));
                output.push_str(&format!("{prom_name} {v}\n"));
            }
            metriken::Value::Gauge(v) => {
                output.push_str(&format!("# TYPE {prom_name} gauge\n"));
                output.push_str(&format!("{prom_name} {v}\n"));
            }
            _ => {}
        }
    }

    output
}
