//! Rate Limiting Module
//!
//! Fixed-window request quotas per caller identity and the axum middleware
//! enforcing them.

mod limiter;
mod middleware;


pub use limiter::{RateLimitConfig, RateLimitDecision, RateLimitRecord, RateLimiter};
pub use middleware::{client_identifier, rate_limit_middleware, Identify, RateLimitState};
