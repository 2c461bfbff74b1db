//! API Handlers
//!
//! HTTP request handlers for the cache server endpoints, including the
//! peer protocol endpoint serving raw value bytes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};

use crate::error::{CacheError, Result};
use crate::group::{Group, Registry};
use crate::models::{GetResponse, HealthResponse, PeerQuery, SetRequest, SetResponse, StatsResponse};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The registry this server exposes groups from
    pub registry: Arc<Registry>,
}

impl AppState {
    /// Creates a new AppState over the given registry.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }
}

fn lookup_group(state: &AppState, name: &str) -> Result<Arc<Group>> {
    state
        .registry
        .get(name)
        .ok_or_else(|| CacheError::GroupNotFound(name.to_string()))
}

/// Handler for GET /api/:group/:key
///
/// Reads a key through the group: local cache, then peers or the data
/// source.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((group, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let group = lookup_group(&state, &group)?;
    let view = group.get(&key).await?;

    Ok(Json(GetResponse::new(key, view.to_string_lossy())))
}

/// Handler for PUT /api/:group
///
/// Writes a key-value pair into the group's local cache with an
/// optional TTL. The write is not replicated to peers.
pub async fn set_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if req.validate().is_some() {
        return Err(CacheError::KeyRequired);
    }

    let group = lookup_group(&state, &group)?;
    let ttl = req.ttl.filter(|&secs| secs > 0).map(Duration::from_secs);
    group.set(&req.key, req.value.as_bytes(), ttl);

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /stats/:group
///
/// Returns the group's cache statistics.
pub async fn stats_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Result<Json<StatsResponse>> {
    let group = lookup_group(&state, &group)?;

    Ok(Json(StatsResponse::new(group.name(), &group.stats())))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

/// Handler for GET /_cache?group=…&key=…
///
/// The peer protocol endpoint: reads a key through the named group and
/// returns the raw value bytes.
pub async fn peer_handler(
    State(state): State<AppState>,
    Query(query): Query<PeerQuery>,
) -> Result<impl IntoResponse> {
    let group = lookup_group(&state, &query.group)?;
    let view = group.get(&query.key).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        view.to_vec(),
    ))
}
