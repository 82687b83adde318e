//! Memcached cache backend.

use super::CacheBackend;
use crate::error::{Error, Result};
use async_memcached::AsciiProtocol;
use deadpool_memcached::{Manager, Pool};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Memcached treats expirations above 30 days as absolute unix timestamps.
const MAX_RELATIVE_EXPIRATION_SECS: u64 = 30 * 24 * 3600;

#[derive(Clone, Debug)]
pub struct MemcachedConfig {
    pub server: String,
    pub pool_size: usize,
}

impl Default for MemcachedConfig {
    fn default() -> Self {
        MemcachedConfig {
            server: "localhost:11211".to_string(),
            pool_size: 16,
        }
    }
}

/// Pooled memcached store.
///
/// ```no_run
/// # use cache_compose::backend::{MemcachedBackend, MemcachedConfig};
/// let backend = MemcachedBackend::new(MemcachedConfig::default())?;
/// # Ok::<(), cache_compose::Error>(())
/// ```
#[derive(Clone)]
pub struct MemcachedBackend {
    pool: Pool,
}

impl MemcachedBackend {
    /// # Errors
    /// Returns `Error::ConfigError` if the pool cannot be built.
    pub fn new(config: MemcachedConfig) -> Result<Self> {
        let pool = Pool::builder(Manager::new(config.server.clone()))
            .max_size(config.pool_size)
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Memcached backend ready for {} (pool size: {})",
            config.server, config.pool_size
        );
        Ok(MemcachedBackend { pool })
    }
}

fn pool_error<E: std::fmt::Display>(e: E) -> Error {
    Error::BackendError(format!("Failed to get Memcached connection: {}", e))
}

/// Expirations that do not fit memcached's signed timestamp store without one.
fn expiration(ttl: Option<Duration>) -> Option<i64> {
    let secs = ttl?.as_secs();
    if secs <= MAX_RELATIVE_EXPIRATION_SECS {
        return i64::try_from(secs).ok();
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    now.checked_add(secs).and_then(|at| i64::try_from(at).ok())
}

impl CacheBackend for MemcachedBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        match conn.get(key).await {
            Ok(Some(value)) => {
                debug!("✓ Memcached GET {} -> HIT", key);
                Ok(value.data)
            }
            Ok(None) => {
                debug!("✓ Memcached GET {} -> MISS", key);
                Ok(None)
            }
            Err(e) => Err(Error::BackendError(format!(
                "Memcached GET failed for key {}: {}",
                key, e
            ))),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.set(key, value.as_slice(), expiration(ttl), None)
            .await
            .map_err(|e| {
                Error::BackendError(format!("Memcached SET failed for key {}: {}", key, e))
            })?;
        debug!("✓ Memcached SET {} (TTL: {:?})", key, ttl);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.delete(key).await.map_err(|e| {
            Error::BackendError(format!("Memcached DELETE failed for key {}: {}", key, e))
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.pool.get().await {
            Ok(mut conn) => Ok(conn.get("__health_check__").await.is_ok()),
            Err(_) => Ok(false),
        }
    }

    async fn clear_all(&self) -> Result<()> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        conn.flush_all()
            .await
            .map_err(|e| Error::BackendError(format!("Memcached FLUSH_ALL failed: {}", e)))?;
        warn!("⚠ Memcached FLUSH_ALL executed - all cache cleared!");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memcached_config_default() {
        let config = MemcachedConfig::default();
        assert_eq!(config.server, "localhost:11211");
        assert_eq!(config.pool_size, 16);
    }

    #[test]
    fn test_expiration_relative_and_absolute() {
        assert_eq!(expiration(None), None);
        assert_eq!(expiration(Some(Duration::from_secs(1800))), Some(1800));

        let long = Duration::from_secs(MAX_RELATIVE_EXPIRATION_SECS + 1);
        let absolute = expiration(Some(long)).unwrap();
        assert!(absolute > MAX_RELATIVE_EXPIRATION_SECS as i64);
    }

    #[test]
    fn test_expiration_overflow_means_no_expiry() {
        assert_eq!(expiration(Some(Duration::from_secs(u64::MAX))), None);
        assert_eq!(expiration(Some(Duration::from_secs(u64::MAX / 60 * 60))), None);
    }
}
