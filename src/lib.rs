//! # cache-compose
//!
//! A policy-driven read-through cache for named, expensive data sources.
//!
//! A caller names the data it needs, supplies a producer that computes it,
//! and a [`CachePolicy`] deciding how (and whether) to cache it. The
//! [`ReadThroughCache`] returns stored data when present and computes, stores
//! and returns it otherwise.
//!
//! ## Features
//!
//! - **Plain or tagged entries:** tagged entries are only visible through the
//!   tag set they were written with, and whole tag sets can be flushed
//! - **Backend Agnostic:** in-memory and Memcached backends, or your own
//!   [`CacheBackend`]
//! - **Explicit errors:** bad identifiers and empty tag sets fail before any
//!   store access or computation
//! - **Optional single-flight:** concurrent misses on one key compute once
//!
//! ## Quick Start
//!
//! ```
//! use cache_compose::{backend::InMemoryBackend, CacheConfig, CachePolicy, ReadThroughCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> cache_compose::Result<()> {
//! let cache = ReadThroughCache::new(InMemoryBackend::new())
//!     .with_config(CacheConfig::default().with_ttl_minutes(60));
//!
//! let policy = CachePolicy::new().with_tags(["reports"]);
//! let total: u64 = cache
//!     .resolve("monthly_total", &policy, || async { Ok(1_250) })
//!     .await?;
//!
//! assert_eq!(total, 1_250);
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod composer;
pub mod config;
pub mod error;
mod flight;
pub mod key;
pub mod observability;
pub mod policy;
pub mod read_through;
pub mod serialization;
pub mod truthiness;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use builder::ResolveBuilder;
pub use composer::{Composer, ViewData};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use key::{CacheKeyBuilder, Identifier, IdentifierRule};
pub use policy::CachePolicy;
pub use read_through::ReadThroughCache;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
