//! Key/value caching with per-entry expiry.
//!
//! The pipeline caches two things: the raw torrent pool of a title and the
//! final stream list of a request. Writers do not coordinate; two requests
//! missing the same key both populate it and the last write wins.

mod memory;

use std::time::Duration;

use async_trait::async_trait;

pub use memory::MemoryCache;

/// A TTL-bounded cache.
#[async_trait]
pub trait Cache<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// Value stored under `key`, unless absent or expired.
    async fn get(&self, key: &str) -> Option<V>;

    /// Store `value` under `key` for `ttl`.
    async fn set(&self, key: &str, value: V, ttl: Duration);
}
