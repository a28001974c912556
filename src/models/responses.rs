//! Response DTOs for the cache service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::CacheStats;

/// Response body for GET /cache/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /cache
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /cache/:key
///
/// Deleting a missing key is not an error; `deleted` is false.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub key: String,
    pub deleted: bool,
}

/// Response body for prefix deletion (DELETE /cache/prefix/:prefix)
#[derive(Debug, Clone, Serialize)]
pub struct PrefixDeleteResponse {
    pub prefix: String,
    pub removed: usize,
}

/// Response body for bulk removals (POST /invalidate, DELETE /cache)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub invalidated: u64,
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Identifiers with a live or not yet swept rate limit record
    pub rate_limited_clients: usize,
}

impl StatsResponse {
    pub fn new(stats: &CacheStats, rate_limited_clients: usize) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            invalidated: stats.invalidated,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
            rate_limited_clients,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
