//! API Handlers
//!
//! HTTP request handlers for each cache service endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::cache::{CacheManager, CacheStore, Entity};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    validate_key, DeleteResponse, GetResponse, HealthResponse, PrefixDeleteResponse,
    RemovedResponse, SetRequest, SetResponse, StatsResponse,
};
use crate::ratelimit::{RateLimitConfig, RateLimiter};

/// Application state shared across all handlers.
///
/// The cache store and rate limiter are constructed here and injected, never global.
#[derive(Clone)]
pub struct AppState {
    /// Invalidation-aware handle over the shared cache store
    pub cache: CacheManager<Value>,
    pub limiter: Arc<RateLimiter>,
    pub rate_limit: RateLimitConfig,
    /// TTL for entries stored without one
    pub default_ttl: Duration,
}

impl AppState {
    pub fn new(cache: CacheStore<Value>, limiter: RateLimiter, config: &Config) -> Self {
        Self {
            cache: CacheManager::new(Arc::new(RwLock::new(cache))),
            limiter: Arc::new(limiter),
            rate_limit: config.rate_limit(),
            default_ttl: config.default_ttl(),
        }
    }

    /// Creates a new AppState from configuration, on the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::new(CacheStore::new(), RateLimiter::new(), config)
    }
}

/// Handler for PUT /cache
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl.map(Duration::from_secs).unwrap_or(state.default_ttl);
    state.cache.set(req.key.clone(), req.value, ttl).await;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /cache/:key
///
/// Absent and expired keys are both reported as 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .await
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /cache/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<DeleteResponse> {
    let deleted = state.cache.delete(&key).await;
    Json(DeleteResponse { key, deleted })
}

/// Handler for DELETE /cache/prefix/:prefix
pub async fn delete_prefix_handler(
    State(state): State<AppState>,
    Path(prefix): Path<String>,
) -> Result<Json<PrefixDeleteResponse>> {
    if let Some(error_msg) = validate_key(&prefix) {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let removed = state.cache.delete_by_prefix(&prefix).await;
    info!(prefix = %prefix, removed, "Deleted cache entries by prefix");

    Ok(Json(PrefixDeleteResponse { prefix, removed }))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    let removed = state.cache.invalidate_all().await;
    Json(RemovedResponse { removed })
}

/// Handler for POST /invalidate
///
/// Body names the mutated entity, e.g. `{"entity": "group", "id": "42"}`.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(entity): Json<Entity>,
) -> Json<RemovedResponse> {
    let removed = state.cache.invalidate(&entity).await;
    Json(RemovedResponse { removed })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.cache().read().await.stats();
    Json(StatsResponse::new(&stats, state.limiter.len()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
