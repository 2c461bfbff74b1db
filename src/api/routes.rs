//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{get, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_handler, health_handler, peer_handler, set_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /api/:group/:key` - Read a key through a group
/// - `PUT /api/:group` - Write a key-value pair into a group
/// - `GET /stats/:group` - Get a group's cache statistics
/// - `GET /health` - Health check endpoint
/// - `GET /_cache?group=…&key=…` - Peer protocol, raw value bytes
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router with all endpoints
    Router::new()
        .route("/api/:group/:key", get(get_handler))
        .route("/api/:group", put(set_handler))
        .route("/stats/:group", get(stats_handler))
        .route("/health", get(health_handler))
        .route("/_cache", get(peer_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
