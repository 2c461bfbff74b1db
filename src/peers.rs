//! Peer Abstraction Module
//!
//! Contracts between a group and its collaborators: the data source
//! that materializes cold keys, and the peer picker/client pair the
//! transport implements.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

// == Data Source ==
/// Loads the authoritative bytes for a key.
///
/// The engine assumes two calls with the same key yield equivalent
/// bytes; sources violating that observe cached staleness.
#[async_trait]
pub trait Source: Send + Sync {
    async fn get(&self, key: &str) -> Result<Vec<u8>>;
}

/// Adapts a plain function into a [`Source`].
pub struct SourceFn<F> {
    f: F,
}

impl<F> SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> Source for SourceFn<F>
where
    F: Fn(&str) -> Result<Vec<u8>> + Send + Sync,
{
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (self.f)(key)
    }
}

// == File Source ==
/// Data source materializing each key from a file of the same name
/// under a root directory.
///
/// Keys naming anything but a plain file in the root are rejected, so
/// a key cannot escape the directory.
pub struct FileSource {
    root: std::path::PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl Source for FileSource {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(crate::error::CacheError::Upstream(format!(
                "invalid origin key: {key}"
            )));
        }
        let path = self.root.join(key);
        tokio::fs::read(&path)
            .await
            .map_err(|err| crate::error::CacheError::Upstream(format!("{}: {err}", path.display())))
    }
}

// == Peer Contracts ==
/// Locates the peer owning a key.
pub trait PeerPicker: Send + Sync {
    /// Returns a client for the owning peer, or None when the key is
    /// owned locally (or no peers are configured).
    fn pick_peer(&self, key: &str) -> Option<Arc<dyn PeerClient>>;
}

/// Fetches a value from one remote peer.
///
/// The request carries the group name and the key; the response carries
/// the value bytes. Framing is the transport's business.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn fetch(&self, group: &str, key: &str) -> Result<Vec<u8>>;
}
