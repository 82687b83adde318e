//! Identifier validation and cache key derivation.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha1::{Digest, Sha1};
use std::fmt;

// Only anchors the start, so any string (including "") matches.
static PREFIX_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*").expect("valid identifier regex"));

static STRICT_RULE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*$").expect("valid identifier regex"));

/// Naming rule applied to identifiers before any cache work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentifierRule {
    /// `^[A-Za-z0-9_]*` matched against the start of the name.
    #[default]
    Prefix,
    /// `^[A-Za-z0-9_]*$` matched against the whole name.
    Strict,
}

impl IdentifierRule {
    fn regex(&self) -> &'static Regex {
        match self {
            IdentifierRule::Prefix => &*PREFIX_RULE,
            IdentifierRule::Strict => &*STRICT_RULE,
        }
    }
}

/// A validated name for a cached data item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier(String);

impl Identifier {
    /// Validate `name` against `rule`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidIdentifier` naming the offending string.
    pub fn parse(name: &str, rule: IdentifierRule) -> Result<Self> {
        if rule.regex().is_match(name) {
            Ok(Identifier(name.to_string()))
        } else {
            Err(Error::InvalidIdentifier(name.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builds storage keys from identifiers.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Lowercase SHA-1 hex digest of the identifier.
    pub fn build(identifier: &Identifier) -> String {
        sha1_hex(identifier.as_str())
    }
}

pub(crate) fn sha1_hex(input: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
