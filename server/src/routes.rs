//! HTTP surface of a node: peer protocol and API front-end.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use meshcache::{CacheError, Group, Registry};
use protocol_mesh::encode_value;
use serde::Deserialize;

use crate::metrics;

/// Router for the peer protocol: `GET {base_path}{group}/{key}`.
///
/// Requests under the base path that do not carry exactly a group and a key
/// segment are malformed and answered with 400; requests outside the base
/// path fall through to the router's default 404.
pub fn peer_router(registry: Registry, base_path: &str) -> Router {
    let routes = Router::new()
        .route("/{group}/{key}", get(serve_value))
        .fallback(malformed_path)
        .with_state(registry);

    match base_path.trim_end_matches('/') {
        "" => routes,
        prefix => Router::new().nest(prefix, routes),
    }
}

async fn malformed_path() -> Response {
    metrics::PEER_REQUESTS.increment();
    metrics::PEER_REQUEST_ERRORS.increment();
    (StatusCode::BAD_REQUEST, "Bad Request\n").into_response()
}

async fn serve_value(
    State(registry): State<Registry>,
    Path((group_name, key)): Path<(String, String)>,
) -> Response {
    metrics::PEER_REQUESTS.increment();

    let Some(group) = registry.get(&group_name) else {
        metrics::PEER_REQUEST_ERRORS.increment();
        let err = CacheError::UnknownGroup(group_name);
        return (StatusCode::NOT_FOUND, format!("{err}\n")).into_response();
    };

    match group.get(&key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, protocol_mesh::CONTENT_TYPE)],
            encode_value(view.as_bytes()),
        )
            .into_response(),
        Err(err) => {
            metrics::PEER_REQUEST_ERRORS.increment();
            (error_status(&err), format!("{err}\n")).into_response()
        }
    }
}

/// Router for the external front-end: `GET /api?key=K` returns the raw
/// value bytes.
pub fn api_router(group: Arc<Group>) -> Router {
    Router::new().route("/api", get(api_get)).with_state(group)
}

#[derive(Deserialize)]
struct ApiQuery {
    key: String,
}

async fn api_get(State(group): State<Arc<Group>>, Query(query): Query<ApiQuery>) -> Response {
    metrics::API_REQUESTS.increment();

    match group.get(&query.key).await {
        Ok(view) => (
            [(header::CONTENT_TYPE, protocol_mesh::CONTENT_TYPE)],
            view.to_vec(),
        )
            .into_response(),
        Err(err) => {
            metrics::API_REQUEST_ERRORS.increment();
            (error_status(&err), format!("{err}\n")).into_response()
        }
    }
}

fn error_status(err: &CacheError) -> StatusCode {
    match err {
        CacheError::EmptyKey => StatusCode::BAD_REQUEST,
        CacheError::UnknownGroup(_) => StatusCode::NOT_FOUND,
        CacheError::Loader(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
