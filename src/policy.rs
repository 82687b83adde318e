//! Per-call caching policy.

use std::collections::BTreeSet;

/// Caching switches governing one resolve call.
///
/// # Example
///
/// ```
/// use cache_compose::CachePolicy;
///
/// let policy = CachePolicy::new()
///     .with_tags(["reports", "dashboard"])
///     .with_ttl_minutes(30);
///
/// assert!(policy.enabled);
/// assert!(policy.use_tags);
/// assert_eq!(policy.ttl_minutes, Some(30));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePolicy {
    /// `false` bypasses the cache entirely.
    pub enabled: bool,
    /// Store entries under the tag scope formed by `tags`.
    pub use_tags: bool,
    pub tags: BTreeSet<String>,
    /// Overrides the configured default TTL. `Some(0)` stores without expiry.
    pub ttl_minutes: Option<u64>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy {
            enabled: true,
            use_tags: false,
            tags: BTreeSet::new(),
            ttl_minutes: None,
        }
    }
}

impl CachePolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy that always calls the producer and never touches the store.
    pub fn bypass() -> Self {
        Self::default().disabled()
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Enable tagging and add `tags` to the tag set.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.use_tags = true;
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_ttl_minutes(mut self, minutes: u64) -> Self {
        self.ttl_minutes = Some(minutes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = CachePolicy::default();
        assert!(policy.enabled);
        assert!(!policy.use_tags);
        assert!(policy.tags.is_empty());
        assert_eq!(policy.ttl_minutes, None);
    }

    #[test]
    fn test_tags_are_a_set() {
        let a = CachePolicy::new().with_tags(["b", "a", "a"]);
        let b = CachePolicy::new().with_tags(["a", "b"]);
        assert_eq!(a.tags, b.tags);
        assert_eq!(a.tags.len(), 2);
    }

    #[test]
    fn test_empty_tags_still_request_tagging() {
        let policy = CachePolicy::new().with_tags(Vec::<String>::new());
        assert!(policy.use_tags);
        assert!(policy.tags.is_empty());
    }

    #[test]
    fn test_bypass() {
        assert!(!CachePolicy::bypass().enabled);
    }
}
