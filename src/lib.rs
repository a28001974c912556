//! Clinic Core - caching, rate limiting and retries for the clinic portal
//!
//! Provides a TTL cache with entity-driven invalidation, a fixed-window rate
//! limiter, a retry helper for backend calls, and an HTTP service over them.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod ratelimit;
pub mod retry;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_cleanup_task, spawn_sweep_task};
