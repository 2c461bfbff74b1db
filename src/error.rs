//! Error types for the cache engine and its HTTP surface
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the group cache.
///
/// Variants are clonable so a coalesced load can hand the same error to
/// every caller waiting on it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Get was called with an empty key
    #[error("key is required")]
    KeyRequired,

    /// No group registered under the given name
    #[error("no such group: {0}")]
    GroupNotFound(String),

    /// The data source failed to materialize the key
    #[error("source error: {0}")]
    Upstream(String),

    /// A peer fetch failed
    #[error("peer error: {0}")]
    Peer(String),

    /// Internal engine error
    #[error("internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let status = match &self {
            CacheError::KeyRequired => StatusCode::BAD_REQUEST,
            CacheError::GroupNotFound(_) => StatusCode::NOT_FOUND,
            CacheError::Upstream(_) => StatusCode::BAD_GATEWAY,
            CacheError::Peer(_) => StatusCode::BAD_GATEWAY,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
