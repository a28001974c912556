//! Rate limiting middleware
//!
//! Screens inbound requests with a [`RateLimiter`] before they reach handlers.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::clock::to_rfc3339;
use crate::error::ApiError;
use crate::ratelimit::{RateLimitConfig, RateLimitDecision, RateLimiter};

const LIMIT_HEADER: &str = "x-ratelimit-limit";
const REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RESET_HEADER: &str = "x-ratelimit-reset";

/// Derives the quota identifier of a request from its headers and, when the
/// server was started with connection info, the peer address.
pub type Identify = Arc<dyn Fn(&HeaderMap, Option<SocketAddr>) -> String + Send + Sync>;

// == Middleware State ==
#[derive(Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub config: RateLimitConfig,
    pub identify: Identify,
}

impl fmt::Debug for RateLimitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateLimitState")
            .field("limiter", &self.limiter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RateLimitState {
    /// Uses [`client_identifier`] to key requests.
    pub fn new(limiter: Arc<RateLimiter>, config: RateLimitConfig) -> Self {
        Self {
            limiter,
            config,
            identify: Arc::new(client_identifier),
        }
    }

    /// Replaces the identifier, e.g. with one that only trusts proxy headers
    /// from known addresses.
    pub fn with_identify<F>(mut self, identify: F) -> Self
    where
        F: Fn(&HeaderMap, Option<SocketAddr>) -> String + Send + Sync + 'static,
    {
        self.identify = Arc::new(identify);
        self
    }
}

/// Default identifier: first `x-forwarded-for` hop, then `x-real-ip`, then the
/// peer IP, else `"unknown"`.
pub fn client_identifier(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("x-forwarded-for")
        .or_else(|| header("x-real-ip"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

// == Middleware ==
/// Admits or rejects a request and stamps quota headers on the response.
///
/// Rejections become 429 responses carrying the window reset time.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let identifier = (state.identify)(request.headers(), peer);
    let decision = state.limiter.check_with(&identifier, &state.config);

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        warn!(
            identifier = %identifier,
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        ApiError::RateLimited {
            retry_after_secs: decision.retry_after_secs(state.limiter.now_ms()),
            reset_at: to_rfc3339(decision.reset_at),
        }
        .into_response()
    };

    apply_quota_headers(response.headers_mut(), &state.config, &decision);
    response
}

fn apply_quota_headers(headers: &mut HeaderMap, config: &RateLimitConfig, decision: &RateLimitDecision) {
    headers.insert(LIMIT_HEADER, HeaderValue::from(config.max_requests));
    headers.insert(REMAINING_HEADER, HeaderValue::from(decision.remaining));
    // Unix seconds
    headers.insert(RESET_HEADER, HeaderValue::from(decision.reset_at / 1000));
}
