//! Named data sources and the variable bindings they produce.

use crate::error::{Error, Result};
use crate::policy::CachePolicy;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// A named, possibly expensive source of data for a view.
///
/// # Example
///
/// ```
/// use cache_compose::{CachePolicy, Composer, Result};
///
/// struct ActiveUsers;
///
/// impl Composer for ActiveUsers {
///     type Output = u64;
///
///     fn output_variable(&self) -> &str {
///         "active_users"
///     }
///
///     fn policy(&self) -> CachePolicy {
///         CachePolicy::new().with_tags(["users"]).with_ttl_minutes(5)
///     }
///
///     async fn produce(&self) -> Result<u64> {
///         Ok(1_024)
///     }
/// }
/// ```
#[allow(async_fn_in_trait)]
pub trait Composer {
    type Output: Serialize + DeserializeOwned;

    /// Name the produced data is bound to. Also the cache identifier.
    fn output_variable(&self) -> &str;

    /// Caching policy for this source. Defaults to untagged caching with the
    /// configured TTL.
    fn policy(&self) -> CachePolicy {
        CachePolicy::default()
    }

    /// Compute the data. Only called on a cache miss or when caching is off.
    async fn produce(&self) -> Result<Self::Output>;
}

/// Variable bindings handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewData {
    vars: Map<String, Value>,
}

impl ViewData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `value`, replacing any previous binding.
    pub fn with<T: Serialize>(&mut self, name: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)
            .map_err(|e| Error::SerializationError(format!("{}: {}", name, e)))?;
        self.vars.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Read a binding back as a typed value.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        self.vars
            .get(name)
            .map(|v| {
                serde_json::from_value(v.clone())
                    .map_err(|e| Error::DeserializationError(format!("{}: {}", name, e)))
            })
            .transpose()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::ReadThroughCache;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Headline {
        title: String,
    }

    struct HeadlineComposer {
        calls: AtomicUsize,
    }

    impl Composer for HeadlineComposer {
        type Output = Headline;

        fn output_variable(&self) -> &str {
            "headline"
        }

        async fn produce(&self) -> Result<Headline> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Headline {
                title: "Hello".to_string(),
            })
        }
    }

    #[test]
    fn test_view_data_bindings() {
        let mut view = ViewData::new();
        view.with("count", &3u32).unwrap();
        view.with("count", &4u32).unwrap();

        assert_eq!(view.len(), 1);
        assert_eq!(view.get_as::<u32>("count").unwrap(), Some(4));
        assert_eq!(view.get_as::<u32>("missing").unwrap(), None);
        assert!(matches!(
            view.get_as::<String>("count"),
            Err(Error::DeserializationError(_))
        ));
    }

    #[tokio::test]
    async fn test_compose_binds_and_caches() {
        let cache = ReadThroughCache::new(InMemoryBackend::new());
        let composer = HeadlineComposer {
            calls: AtomicUsize::new(0),
        };

        let mut first = ViewData::new();
        cache.compose(&composer, &mut first).await.unwrap();
        let mut second = ViewData::new();
        cache.compose(&composer, &mut second).await.unwrap();

        let expected = Headline {
            title: "Hello".to_string(),
        };
        assert_eq!(first.get_as::<Headline>("headline").unwrap(), Some(expected));
        assert_eq!(first, second);
        assert_eq!(composer.calls.load(Ordering::SeqCst), 1);
    }
}
