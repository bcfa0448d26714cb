//! # Rate-Limit-Aware Response Cache
//!
//! The backend refuses to re-serve a rate-limited read more often than a
//! fixed interval for identical parameters. This module keeps callers
//! inside that policy while still giving them fresh-enough data and a
//! clear freshness report: a coalescing TTL cache keyed by
//! (method, environment, canonical parameters), an allow-list of the read
//! methods the policy covers, and the static graph of which cached reads a
//! successful mutation invalidates.

pub mod invalidation;
pub mod key;
pub mod store;

pub use invalidation::{invalidation_prefixes, is_rate_limited_read};
pub use key::{canonical_json, CacheKey};
pub use store::{CacheInfo, ResponseCache};
