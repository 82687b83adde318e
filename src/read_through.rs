//! Read-through cache - the cache-or-compute decision engine.

use crate::backend::{CacheBackend, TaggedCache};
use crate::composer::{Composer, ViewData};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::flight::KeyLocks;
use crate::key::{CacheKeyBuilder, Identifier};
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::policy::CachePolicy;
use crate::serialization::{deserialize_from_cache, serialize_for_cache};
use crate::truthiness::is_truthy;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::time::{Duration, Instant};

/// Returns stored data for an identifier, or computes, stores and returns it.
///
/// Per call the store sees one of: nothing (caching disabled), one read (hit),
/// or one read and one write (miss), not counting the tag version lookups of
/// the tagged path. The producer runs at most once.
///
/// # Example
///
/// ```
/// use cache_compose::{backend::InMemoryBackend, CachePolicy, ReadThroughCache};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> cache_compose::Result<()> {
/// let cache = ReadThroughCache::new(InMemoryBackend::new());
/// let policy = CachePolicy::new().with_ttl_minutes(30);
///
/// let count: u64 = cache.resolve("user_count", &policy, || async { Ok(42) }).await?;
/// assert_eq!(count, 42);
/// # Ok(())
/// # }
/// ```
pub struct ReadThroughCache<B: CacheBackend> {
    backend: B,
    config: CacheConfig,
    metrics: Box<dyn CacheMetrics>,
    locks: Option<KeyLocks>,
}

impl<B: CacheBackend> ReadThroughCache<B> {
    /// Create a cache over `backend` with default configuration.
    pub fn new(backend: B) -> Self {
        ReadThroughCache {
            backend,
            config: CacheConfig::default(),
            metrics: Box::new(NoOpMetrics),
            locks: None,
        }
    }

    pub fn with_config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Serialize concurrent misses on the same key so the producer runs once.
    ///
    /// A caller that waited re-reads the store before computing, which adds
    /// one read to its miss path.
    pub fn with_single_flight(mut self) -> Self {
        self.locks = Some(KeyLocks::default());
        self
    }

    /// Fluent form of [`resolve`](Self::resolve).
    pub fn builder(&self, identifier: impl Into<String>) -> crate::builder::ResolveBuilder<'_, B> {
        crate::builder::ResolveBuilder::new(self, identifier.into())
    }

    /// Resolve `identifier` under `policy`, calling `producer` only when needed.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidIdentifier`: identifier fails the naming rule (nothing else runs)
    /// - `Error::EmptyTagSet`: tagging requested without tags (producer not called)
    /// - `Error::BackendError`: store read or write failed
    /// - `Error::InvalidCacheEntry` / `Error::VersionMismatch` /
    ///   `Error::DeserializationError`: stored bytes cannot be decoded
    /// - any error returned by `producer`
    pub async fn resolve<T, P, Fut>(
        &self,
        identifier: &str,
        policy: &CachePolicy,
        producer: P,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let timer = Instant::now();
        let id = Identifier::parse(identifier, self.config.identifier_rule())?;

        if !self.config.enabled || !policy.enabled {
            debug!("» Caching disabled for {:?}, calling producer", id.as_str());
            let data = producer().await?;
            self.metrics.record_bypass(id.as_str(), timer.elapsed());
            return Ok(data);
        }

        let key = CacheKeyBuilder::build(&id);
        let ttl = self.config.effective_ttl(policy.ttl_minutes);

        let result = if policy.use_tags {
            self.resolve_tagged(&id, &key, &policy.tags, ttl, producer, timer)
                .await
        } else {
            self.resolve_plain(&id, &key, ttl, producer, timer).await
        };

        if let Err(e) = &result {
            self.metrics.record_error(&key, &e.to_string());
        }
        result
    }

    async fn resolve_plain<T, P, Fut>(
        &self,
        id: &Identifier,
        key: &str,
        ttl: Option<Duration>,
        producer: P,
        timer: Instant,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        debug!("» Plain lookup for {:?} (key: {})", id.as_str(), key);

        if let Some(bytes) = self.backend.get(key).await? {
            debug!("✓ Cache hit for {}", key);
            let data = deserialize_from_cache(&bytes)?;
            self.metrics.record_hit(key, timer.elapsed());
            return Ok(data);
        }

        let _flight = match &self.locks {
            Some(locks) => {
                let guard = locks.acquire(key).await;
                if let Some(bytes) = self.backend.get(key).await? {
                    debug!("✓ Cache filled by concurrent caller for {}", key);
                    let data = deserialize_from_cache(&bytes)?;
                    self.metrics.record_hit(key, timer.elapsed());
                    return Ok(data);
                }
                Some(guard)
            }
            None => None,
        };

        debug!("✗ Cache miss for {}, calling producer", key);
        let data = producer().await?;
        self.backend
            .set(key, serialize_for_cache(&data)?, ttl)
            .await?;
        self.metrics.record_miss(key, timer.elapsed());
        info!("✓ Cached {:?} (TTL: {:?})", id.as_str(), ttl);
        Ok(data)
    }

    async fn resolve_tagged<T, P, Fut>(
        &self,
        id: &Identifier,
        key: &str,
        tags: &BTreeSet<String>,
        ttl: Option<Duration>,
        producer: P,
        timer: Instant,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let scope = TaggedCache::new(&self.backend, tags)?;
        debug!(
            "» Tagged lookup for {:?} (key: {}, tags: {:?})",
            id.as_str(),
            key,
            scope.tags()
        );

        if let Some(data) = self.tagged_hit::<T>(&scope, key).await? {
            self.metrics.record_hit(key, timer.elapsed());
            return Ok(data);
        }

        let _flight = match &self.locks {
            Some(locks) => {
                let guard = locks.acquire(key).await;
                if let Some(data) = self.tagged_hit::<T>(&scope, key).await? {
                    self.metrics.record_hit(key, timer.elapsed());
                    return Ok(data);
                }
                Some(guard)
            }
            None => None,
        };

        debug!("✗ Tagged cache miss for {}, calling producer", key);
        let data = producer().await?;
        scope.put(key, serialize_for_cache(&data)?, ttl).await?;
        self.metrics.record_miss(key, timer.elapsed());
        info!("✓ Cached {:?} under tags {:?} (TTL: {:?})", id.as_str(), scope.tags(), ttl);
        Ok(data)
    }

    /// A stored value that is falsy counts as absent on the tagged path.
    async fn tagged_hit<T>(&self, scope: &TaggedCache<'_, B>, key: &str) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
    {
        let Some(bytes) = scope.get(key).await? else {
            return Ok(None);
        };
        let data: T = deserialize_from_cache(&bytes)?;
        if is_truthy(&data)? {
            debug!("✓ Tagged cache hit for {}", key);
            Ok(Some(data))
        } else {
            debug!("Tagged entry for {} is falsy, recomputing", key);
            Ok(None)
        }
    }

    /// Remove the entry for `identifier`, in the tag scope when `policy` uses
    /// tags.
    ///
    /// # Errors
    /// Same validation errors as [`resolve`](Self::resolve), plus backend errors.
    pub async fn forget(&self, identifier: &str, policy: &CachePolicy) -> Result<()> {
        let id = Identifier::parse(identifier, self.config.identifier_rule())?;
        let key = CacheKeyBuilder::build(&id);

        if policy.use_tags {
            TaggedCache::new(&self.backend, &policy.tags)?
                .forget(&key)
                .await?;
        } else {
            self.backend.delete(&key).await?;
        }
        debug!("✓ Forgot cached {:?}", id.as_str());
        Ok(())
    }

    /// Invalidate everything stored under a tag set sharing any of `tags`.
    ///
    /// # Errors
    /// `Error::EmptyTagSet` when `tags` is empty, or backend errors.
    pub async fn flush_tags<I, S>(&self, tags: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        TaggedCache::new(&self.backend, &tags)?.flush().await
    }

    /// Resolve `composer` with its own policy and bind the result into `view`
    /// under its output variable.
    ///
    /// # Errors
    /// Any error from [`resolve`](Self::resolve), or
    /// `Error::SerializationError` if the data cannot be bound.
    pub async fn compose<C: Composer>(&self, composer: &C, view: &mut ViewData) -> Result<()> {
        let name = composer.output_variable();
        let policy = composer.policy();
        let data = self.resolve(name, &policy, move || composer.produce()).await?;
        view.with(name, &data)
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get backend reference (for advanced use).
    pub fn backend(&self) -> &B {
        &self.backend
    }
}
