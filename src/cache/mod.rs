//! Cache Module
//!
//! Local storage for a group: bounded LRU with TTL expiry, wrapped in a
//! thread-safe guard with deferred allocation.

mod byteview;
mod entry;
mod guard;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use byteview::{ByteLen, ByteView};
pub use guard::GuardedCache;
pub use stats::CacheStats;
pub use store::LruStore;
