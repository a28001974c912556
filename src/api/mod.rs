//! API Module
//!
//! HTTP handlers and routing for the cache service.
//!
//! # Endpoints
//! - `PUT /cache`, `DELETE /cache`
//! - `GET /cache/:key`, `DELETE /cache/:key`
//! - `DELETE /cache/prefix/:prefix`
//! - `POST /invalidate`
//! - `GET /stats`, `GET /health`

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
