//! Tag-scoped view over a backend.
//!
//! Every tag owns a version id stored under `tag:{sha1(name)}:key`. The ids of a tag
//! set, joined in sorted tag order, form the scope namespace, and entries are
//! stored as `sha1(namespace):key`. An entry is therefore only reachable
//! through the exact tag set it was written with, and rotating a tag's id
//! orphans every entry written under a set containing that tag.

use super::CacheBackend;
use crate::error::{Error, Result};
use crate::key::sha1_hex;
use std::collections::BTreeSet;
use std::time::Duration;
use uuid::Uuid;

/// Cache operations scoped to a non-empty set of tags.
pub struct TaggedCache<'a, B: CacheBackend> {
    backend: &'a B,
    tags: Vec<String>,
}

impl<'a, B: CacheBackend> TaggedCache<'a, B> {
    /// # Errors
    /// Returns `Error::EmptyTagSet` if `tags` is empty.
    pub fn new(backend: &'a B, tags: &BTreeSet<String>) -> Result<Self> {
        if tags.is_empty() {
            return Err(Error::EmptyTagSet);
        }
        Ok(TaggedCache {
            backend,
            tags: tags.iter().cloned().collect(),
        })
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let scoped = self.scoped_key(key).await?;
        self.backend.get(&scoped).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        let scoped = self.scoped_key(key).await?;
        self.backend.exists(&scoped).await
    }

    pub async fn put(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let scoped = self.scoped_key(key).await?;
        self.backend.set(&scoped, value, ttl).await
    }

    pub async fn forget(&self, key: &str) -> Result<()> {
        let scoped = self.scoped_key(key).await?;
        self.backend.delete(&scoped).await
    }

    /// Invalidate every entry stored under any tag set that shares a tag with
    /// this one.
    pub async fn flush(&self) -> Result<()> {
        for tag in &self.tags {
            self.reset_tag(tag).await?;
        }
        info!("✓ Flushed cache tags {:?}", self.tags);
        Ok(())
    }

    async fn scoped_key(&self, key: &str) -> Result<String> {
        let namespace = self.namespace().await?;
        Ok(format!("{}:{}", sha1_hex(&namespace), key))
    }

    async fn namespace(&self) -> Result<String> {
        let mut ids = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            ids.push(self.tag_id(tag).await?);
        }
        Ok(ids.join("|"))
    }

    async fn tag_id(&self, tag: &str) -> Result<String> {
        match self.backend.get(&tag_key(tag)).await? {
            Some(raw) => String::from_utf8(raw).map_err(|e| {
                Error::InvalidCacheEntry(format!("tag id for {} is not UTF-8: {}", tag, e))
            }),
            None => self.reset_tag(tag).await,
        }
    }

    async fn reset_tag(&self, tag: &str) -> Result<String> {
        let id = Uuid::now_v7().simple().to_string();
        self.backend
            .set(&tag_key(tag), id.clone().into_bytes(), None)
            .await?;
        debug!("Tag {} now at version {}", tag, id);
        Ok(id)
    }
}

// Hashed so that tag names of any length or charset give memcached-safe keys.
fn tag_key(tag: &str) -> String {
    format!("tag:{}:key", sha1_hex(tag))
}
