//! In-process cache backend.

use super::CacheBackend;
use crate::error::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map_or(false, |at| at <= now)
    }
}

/// Concurrent in-memory backend.
///
/// Cloning is cheap and clones share the same store. Expired entries are
/// dropped lazily when read.
///
/// # Example
///
/// ```
/// # use cache_compose::backend::{CacheBackend, InMemoryBackend};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cache_compose::Result<()> {
/// let backend = InMemoryBackend::new();
/// backend.set("key", b"value".to_vec(), None).await?;
/// assert_eq!(backend.get("key").await?, Some(b"value".to_vec()));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<DashMap<String, Entry>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub async fn len(&self) -> usize {
        self.store.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl CacheBackend for InMemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let now = Instant::now();

        let hit = match self.store.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                trace!("InMemory GET {} -> MISS", key);
                return Ok(None);
            }
        };

        match hit {
            Some(value) => {
                trace!("InMemory GET {} -> HIT", key);
                Ok(Some(value))
            }
            None => {
                self.store.remove_if(key, |_, entry| entry.is_expired(now));
                debug!("InMemory GET {} -> EXPIRED", key);
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        // A TTL past the clock's range is treated as no expiry.
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));
        self.store
            .insert(key.to_string(), Entry { value, expires_at });
        trace!("InMemory SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.remove(key);
        Ok(())
    }

    async fn clear_all(&self) -> Result<()> {
        self.store.clear();
        warn!("⚠ InMemory cache cleared");
        Ok(())
    }
}
