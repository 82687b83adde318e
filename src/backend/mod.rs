//! Cache backends.
//!
//! A backend is an external key → bytes store with TTL support. Tag scoping
//! is layered on top of any backend by [`TaggedCache`].

use crate::error::Result;
use std::time::Duration;

#[cfg(feature = "inmemory")]
mod inmemory;
#[cfg(feature = "memcached")]
mod memcached;
mod tagged;

#[cfg(feature = "inmemory")]
pub use inmemory::InMemoryBackend;
#[cfg(feature = "memcached")]
pub use memcached::{MemcachedBackend, MemcachedConfig};
pub use tagged::TaggedCache;

/// Storage contract consumed by the read-through cache.
///
/// Implementations own expiry: `get` must never return an entry whose TTL has
/// elapsed. A `ttl` of `None` stores the entry without expiry.
#[allow(async_fn_in_trait)]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    /// Remove every entry. Destructive; intended for tests and maintenance.
    async fn clear_all(&self) -> Result<()>;
}
