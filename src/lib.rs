//! Peercache - a distributed in-memory group cache
//!
//! Groups answer reads from a bounded local LRU with TTL expiry,
//! coalesce concurrent misses into one load, and route peer-owned keys
//! across a consistent-hash ring of HTTP peers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod flight;
pub mod group;
pub mod models;
pub mod peers;
pub mod ring;
pub mod tasks;
pub mod transport;

pub use api::{create_router, AppState};
pub use cache::{ByteLen, ByteView, CacheStats, GuardedCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use group::{get_group, new_group, Group, Registry};
pub use peers::{FileSource, PeerClient, PeerPicker, Source, SourceFn};
pub use ring::Ring;
pub use transport::HttpPool;
