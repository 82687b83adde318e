//! Builder pattern for one-off resolve calls.

use crate::backend::CacheBackend;
use crate::error::Result;
use crate::policy::CachePolicy;
use crate::ReadThroughCache;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

/// Fluent builder assembling a [`CachePolicy`] for a single resolve.
///
/// # Example
///
/// ```ignore
/// let stats = cache
///     .builder("user_stats")
///     .with_tags(["reports"])
///     .with_ttl_minutes(30)
///     .execute(|| repo.load_stats())
///     .await?;
/// ```
pub struct ResolveBuilder<'a, B: CacheBackend> {
    cache: &'a ReadThroughCache<B>,
    identifier: String,
    policy: CachePolicy,
}

impl<'a, B: CacheBackend> ResolveBuilder<'a, B> {
    pub(crate) fn new(cache: &'a ReadThroughCache<B>, identifier: String) -> Self {
        Self {
            cache,
            identifier,
            policy: CachePolicy::default(),
        }
    }

    /// Start from an existing policy instead of the default one.
    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Store under the tag scope formed by `tags`.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.policy = self.policy.with_tags(tags);
        self
    }

    /// Override the configured TTL for this call.
    pub fn with_ttl_minutes(mut self, minutes: u64) -> Self {
        self.policy = self.policy.with_ttl_minutes(minutes);
        self
    }

    /// Skip the cache for this call.
    pub fn disabled(mut self) -> Self {
        self.policy = self.policy.disabled();
        self
    }

    pub fn policy(&self) -> &CachePolicy {
        &self.policy
    }

    /// Run the resolve with the assembled policy.
    ///
    /// # Errors
    ///
    /// Same as [`ReadThroughCache::resolve`].
    pub async fn execute<T, P, Fut>(self, producer: P) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
        P: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.cache
            .resolve(&self.identifier, &self.policy, producer)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_builder_basic() {
        let cache = ReadThroughCache::new(InMemoryBackend::new());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = cache
                .builder("stats")
                .with_ttl_minutes(30)
                .execute(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(42) }
                })
                .await
                .expect("Failed to execute");
            assert_eq!(value, 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_builder_chaining() {
        let cache = ReadThroughCache::new(InMemoryBackend::new());
        let builder = cache
            .builder("stats")
            .with_tags(["a"])
            .with_tags(["b"])
            .with_ttl_minutes(5)
            .disabled();

        let policy = builder.policy();
        assert!(!policy.enabled);
        assert!(policy.use_tags);
        assert_eq!(policy.tags.len(), 2);
        assert_eq!(policy.ttl_minutes, Some(5));
    }

    #[tokio::test]
    async fn test_builder_disabled_always_produces() {
        let cache = ReadThroughCache::new(InMemoryBackend::new());
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let _: u32 = cache
                .builder("stats")
                .disabled()
                .execute(|| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(1) }
                })
                .await
                .expect("Failed to execute");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.backend().is_empty().await);
    }

    #[tokio::test]
    async fn test_builder_with_policy_and_empty_tags() {
        let cache = ReadThroughCache::new(InMemoryBackend::new());
        let result: Result<u32> = cache
            .builder("stats")
            .with_policy(CachePolicy::new().with_tags(Vec::<String>::new()))
            .execute(|| async { Ok(1) })
            .await;

        assert_eq!(result, Err(Error::EmptyTagSet));
    }
}
