//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and queries.

use serde::Deserialize;

/// Request body for the SET operation (PUT /api/:group)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: Optional TTL in seconds (no expiry if omitted or zero)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data.
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("key is required".to_string());
        }
        None
    }
}

/// Query parameters for the peer protocol endpoint (GET /_cache)
///
/// The two logical fields of a peer fetch: which group to read and
/// which key.
#[derive(Debug, Clone, Deserialize)]
pub struct PeerQuery {
    pub group: String,
    pub key: String,
}
