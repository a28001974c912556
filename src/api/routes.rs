//! API Routes
//!
//! Configures the Axum router with all cache service endpoints.

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, delete_prefix_handler, get_handler, health_handler,
    invalidate_handler, set_handler, stats_handler, AppState,
};
use crate::ratelimit::{rate_limit_middleware, RateLimitState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Store a JSON value
/// - `DELETE /cache` - Clear the cache
/// - `GET /cache/:key` - Retrieve a value by key
/// - `DELETE /cache/:key` - Delete a key
/// - `DELETE /cache/prefix/:prefix` - Delete every key with a prefix
/// - `POST /invalidate` - Apply an entity's invalidation fan-out
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Rate limiting per client on every route except `/health`
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let rate_limit = RateLimitState::new(state.limiter.clone(), state.rate_limit);

    let limited = Router::new()
        .route("/cache", put(set_handler).delete(clear_handler))
        .route("/cache/prefix/:prefix", delete(delete_prefix_handler))
        .route("/cache/:key", get(get_handler).delete(delete_handler))
        .route("/invalidate", post(invalidate_handler))
        .route("/stats", get(stats_handler))
        .route_layer(middleware::from_fn_with_state(
            rate_limit,
            rate_limit_middleware,
        ));

    Router::new()
        .merge(limited)
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
