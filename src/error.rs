//! Error types for the HTTP surface
//!
//! Provides unified error handling using thiserror. The core components never
//! produce these: misses and exhausted quotas are return values.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == API Error Enum ==
/// Unified error type for HTTP handlers and middleware.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Key not found in cache (absent or expired)
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller exhausted its request quota
    #[error("Too many requests, retry after {retry_after_secs}s")]
    RateLimited {
        retry_after_secs: u64,
        /// Window reset as RFC 3339
        reset_at: String,
    },
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        };

        let body = match &self {
            ApiError::RateLimited {
                retry_after_secs,
                reset_at,
            } => json!({
                "error": self.to_string(),
                "reset_at": reset_at,
                "retry_after": retry_after_secs,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited {
            retry_after_secs, ..
        } = self
        {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
