//! Versioned envelopes for cached values.
//!
//! # Format
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: 4 bytes, LE] [POSTCARD PAYLOAD]
//! ```

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};

pub const CACHE_MAGIC: [u8; 4] = *b"RTCE";

/// Bump when the envelope or payload encoding changes.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode `value` into a cache envelope.
pub fn serialize_for_cache<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload =
        postcard::to_allocvec(value).map_err(|e| Error::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&CACHE_MAGIC);
    bytes.extend_from_slice(&CURRENT_SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode a cache envelope, validating magic and version first.
pub fn deserialize_from_cache<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "entry too short: {} bytes",
            bytes.len()
        )));
    }

    let (magic, rest) = bytes.split_at(4);
    if magic != CACHE_MAGIC {
        return Err(Error::InvalidCacheEntry(format!(
            "bad magic header: {:?}",
            magic
        )));
    }

    let (version, payload) = rest.split_at(4);
    let mut raw = [0u8; 4];
    raw.copy_from_slice(version);
    let found = u32::from_le_bytes(raw);
    if found != CURRENT_SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: CURRENT_SCHEMA_VERSION,
            found,
        });
    }

    postcard::from_bytes(payload).map_err(|e| Error::DeserializationError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Stats {
        count: u64,
        label: String,
    }

    #[test]
    fn test_envelope_header() {
        let bytes = serialize_for_cache(&7u32).unwrap();
        assert_eq!(&bytes[..4], b"RTCE");
        assert_eq!(&bytes[4..8], &CURRENT_SCHEMA_VERSION.to_le_bytes());
    }

    #[test]
    fn test_struct_survives_envelope() {
        let stats = Stats {
            count: 42,
            label: "users".to_string(),
        };
        let bytes = serialize_for_cache(&stats).unwrap();
        assert_eq!(deserialize_from_cache::<Stats>(&bytes).unwrap(), stats);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = serialize_for_cache(&1u8).unwrap();
        bytes[0] = b'X';
        assert!(matches!(
            deserialize_from_cache::<u8>(&bytes),
            Err(Error::InvalidCacheEntry(_))
        ));
    }

    #[test]
    fn test_rejects_other_version() {
        let mut bytes = serialize_for_cache(&1u8).unwrap();
        bytes[4..8].copy_from_slice(&99u32.to_le_bytes());
        assert_eq!(
            deserialize_from_cache::<u8>(&bytes),
            Err(Error::VersionMismatch {
                expected: CURRENT_SCHEMA_VERSION,
                found: 99
            })
        );
    }

    #[test]
    fn test_rejects_truncated_entry() {
        assert!(matches!(
            deserialize_from_cache::<u8>(b"RTC"),
            Err(Error::InvalidCacheEntry(_))
        ));
    }
}
