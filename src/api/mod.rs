//! API Module
//!
//! HTTP handlers and routing for the cache server, covering both the
//! client-facing REST surface and the peer protocol endpoint.
//!
//! # Endpoints
//! - `GET /api/:group/:key` - Read a key through a group
//! - `PUT /api/:group` - Write a key-value pair into a group
//! - `GET /stats/:group` - Get a group's cache statistics
//! - `GET /health` - Health check endpoint
//! - `GET /_cache?group=…&key=…` - Peer protocol, raw value bytes

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
