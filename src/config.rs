//! Global cache defaults.

use crate::error::{Error, Result};
use crate::key::IdentifierRule;
use serde::Deserialize;
use std::time::Duration;

const ENV_ENABLED: &str = "COMPOSE_CACHE_ENABLED";
const ENV_TTL_MINUTES: &str = "COMPOSE_CACHE_TTL_MINUTES";
const ENV_STRICT_IDENTIFIERS: &str = "COMPOSE_CACHE_STRICT_IDENTIFIERS";

/// Process-wide defaults consulted by every resolve call.
///
/// `enabled` is a kill switch: when `false` nothing is cached, whatever the
/// per-call policy says. `ttl_minutes` is used when the policy has no TTL of
/// its own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_minutes: Option<u64>,
    pub strict_identifiers: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            ttl_minutes: None,
            strict_identifiers: false,
        }
    }
}

impl CacheConfig {
    /// Parse a JSON document such as `{"enabled": true, "ttl_minutes": 30}`.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` on malformed JSON or wrong field types.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid cache config: {}", e)))
    }

    /// Read overrides from `COMPOSE_CACHE_ENABLED`, `COMPOSE_CACHE_TTL_MINUTES`
    /// and `COMPOSE_CACHE_STRICT_IDENTIFIERS`. Unset variables keep defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = CacheConfig::default();

        if let Some(raw) = lookup(ENV_ENABLED) {
            config.enabled = parse_bool(ENV_ENABLED, &raw)?;
        }
        if let Some(raw) = lookup(ENV_TTL_MINUTES) {
            let minutes = raw.trim().parse::<u64>().map_err(|e| {
                Error::ConfigError(format!("{} must be a whole number: {}", ENV_TTL_MINUTES, e))
            })?;
            config.ttl_minutes = Some(minutes);
        }
        if let Some(raw) = lookup(ENV_STRICT_IDENTIFIERS) {
            config.strict_identifiers = parse_bool(ENV_STRICT_IDENTIFIERS, &raw)?;
        }

        debug!("Loaded cache config from environment: {:?}", config);
        Ok(config)
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_ttl_minutes(mut self, minutes: u64) -> Self {
        self.ttl_minutes = Some(minutes);
        self
    }

    #[must_use]
    pub fn with_strict_identifiers(mut self, strict: bool) -> Self {
        self.strict_identifiers = strict;
        self
    }

    pub fn identifier_rule(&self) -> IdentifierRule {
        if self.strict_identifiers {
            IdentifierRule::Strict
        } else {
            IdentifierRule::Prefix
        }
    }

    /// Resolve the TTL for one write: per-call override, then this config,
    /// then zero. Zero, and minute counts too large to express in seconds,
    /// map to `None` (no expiry).
    pub fn effective_ttl(&self, override_minutes: Option<u64>) -> Option<Duration> {
        let minutes = override_minutes.or(self.ttl_minutes).unwrap_or(0);
        if minutes == 0 {
            return None;
        }
        minutes.checked_mul(60).map(Duration::from_secs)
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::ConfigError(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert!(config.enabled);
        assert_eq!(config.ttl_minutes, None);
        assert_eq!(config.identifier_rule(), IdentifierRule::Prefix);
    }

    #[test]
    fn test_from_json_partial() {
        let config = CacheConfig::from_json(r#"{"ttl_minutes": 15}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.ttl_minutes, Some(15));
    }

    #[test]
    fn test_from_json_rejects_bad_types() {
        let err = CacheConfig::from_json(r#"{"enabled": "maybe"}"#).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_from_lookup() {
        let config = CacheConfig::from_lookup(lookup_from(&[
            (ENV_ENABLED, "false"),
            (ENV_TTL_MINUTES, "45"),
            (ENV_STRICT_IDENTIFIERS, "1"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.ttl_minutes, Some(45));
        assert_eq!(config.identifier_rule(), IdentifierRule::Strict);
    }

    #[test]
    fn test_from_lookup_invalid_ttl() {
        let err = CacheConfig::from_lookup(lookup_from(&[(ENV_TTL_MINUTES, "soon")])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_effective_ttl_order() {
        let config = CacheConfig::default().with_ttl_minutes(10);
        assert_eq!(config.effective_ttl(Some(30)), Some(Duration::from_secs(1800)));
        assert_eq!(config.effective_ttl(None), Some(Duration::from_secs(600)));
        assert_eq!(config.effective_ttl(Some(0)), None);
        assert_eq!(CacheConfig::default().effective_ttl(None), None);
    }

    #[test]
    fn test_effective_ttl_overflow_means_no_expiry() {
        let config = CacheConfig::default();
        assert_eq!(config.effective_ttl(Some(u64::MAX)), None);
        assert_eq!(
            config.effective_ttl(Some(u64::MAX / 60)),
            Some(Duration::from_secs(u64::MAX / 60 * 60))
        );
    }
}
