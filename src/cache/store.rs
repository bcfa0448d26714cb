//! The rate-limit-aware response cache.
//!
//! Entries hold the shared in-flight future for a backend call, not just
//! its eventual value, so concurrent identical reads coalesce into one
//! network round trip and every caller observes the same outcome. Expiry
//! defaults to the backend's minimum-reread interval and is clamped to the
//! `nextAllowedAt` hint when a response carries one, so the cache never
//! claims freshness the backend itself disavows.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;

use crate::errors::Result;
use crate::rpc::envelope::RpcOutcome;

use super::key::CacheKey;

type SharedFetch = Shared<BoxFuture<'static, Result<RpcOutcome>>>;

struct CacheEntry {
    /// Distinguishes this entry from any later one under the same key, so
    /// a slow owner never settles a replacement entry.
    generation: u64,
    payload: SharedFetch,
    created_at: Instant,
    expires_at: Instant,
    /// Backend-advertised next-allowed read, when one arrived.
    next_allowed_at: Option<DateTime<Utc>>,
}

/// Freshness report for one key, for operator display.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheInfo {
    pub cached: bool,
    pub age: Option<Duration>,
    pub next_allowed_at: Option<DateTime<Utc>>,
}

impl CacheInfo {
    fn miss() -> Self {
        Self { cached: false, age: None, next_allowed_at: None }
    }
}

/// In-memory response cache with request coalescing.
///
/// The type is cheap to construct and self-contained; the server process
/// and a caller process each own their own instance with identical
/// semantics.
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
    generation: AtomicU64,
}

fn instant_at(moment: DateTime<Utc>) -> Instant {
    let now = Instant::now();
    match (moment - Utc::now()).to_std() {
        Ok(remaining) => now + remaining,
        // Already in the past: the entry is expired on arrival.
        Err(_) => now,
    }
}

impl ResponseCache {
    /// `default_ttl` is the backend's documented minimum-reread interval.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
            generation: AtomicU64::new(0),
        }
    }

    /// Return the cached or in-flight outcome for `key`, running `fetch`
    /// only when there is neither. Concurrent callers for the same key
    /// share one `fetch` execution; a failed fetch removes its placeholder
    /// entry so the next attempt is not blocked.
    pub async fn get_or_fetch<F>(&self, key: &CacheKey, fetch: F) -> Result<RpcOutcome>
    where
        F: Future<Output = Result<RpcOutcome>> + Send + 'static,
    {
        let flat = key.flat();
        let now = Instant::now();

        enum Role {
            Joined(SharedFetch),
            Owner(SharedFetch, u64),
        }

        let role = {
            let mut entries = self.entries.lock().expect("cache mutex poisoned");
            match entries.get(&flat) {
                Some(entry) if entry.expires_at > now => {
                    tracing::debug!(key = %flat, "Cache hit (resolved or in flight)");
                    Role::Joined(entry.payload.clone())
                }
                _ => {
                    tracing::debug!(key = %flat, "Cache miss, dispatching fetch");
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed);
                    let shared = fetch.boxed().shared();
                    entries.insert(
                        flat.clone(),
                        CacheEntry {
                            generation,
                            payload: shared.clone(),
                            created_at: now,
                            expires_at: now + self.default_ttl,
                            next_allowed_at: None,
                        },
                    );
                    Role::Owner(shared, generation)
                }
            }
        };

        match role {
            Role::Joined(shared) => shared.await,
            Role::Owner(shared, generation) => {
                let outcome = shared.await;
                self.settle(&flat, generation, &outcome);
                outcome
            }
        }
    }

    /// Post-resolution bookkeeping for the entry's owner: clamp expiry to
    /// the backend's hint on success, drop the placeholder on failure.
    fn settle(&self, flat: &str, generation: u64, outcome: &Result<RpcOutcome>) {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let Some(entry) = entries.get_mut(flat) else {
            return;
        };
        if entry.generation != generation {
            return;
        }
        match outcome {
            Ok(resolved) => {
                if let Some(next_allowed) = resolved.next_allowed_at {
                    entry.expires_at = instant_at(next_allowed);
                    entry.next_allowed_at = Some(next_allowed);
                    tracing::debug!(
                        key = %flat,
                        next_allowed_at = %next_allowed,
                        "Clamped cache expiry to backend hint"
                    );
                }
            }
            Err(_) => {
                entries.remove(flat);
                tracing::debug!(key = %flat, "Removed cache entry after failed fetch");
            }
        }
    }

    /// Resolved, fresh payload for `key`, if any. In-flight and expired
    /// entries report a miss.
    pub fn get(&self, key: &CacheKey) -> Option<RpcOutcome> {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        let entry = entries.get(&key.flat())?;
        if entry.expires_at <= Instant::now() {
            return None;
        }
        match entry.payload.peek() {
            Some(Ok(outcome)) => Some(outcome.clone()),
            _ => None,
        }
    }

    /// Insert an already-resolved payload, e.g. one obtained outside the
    /// coalescing path. Expiry is `ttl` (default TTL when `None`), clamped
    /// to the payload's own next-allowed hint when present.
    pub fn put(&self, key: &CacheKey, outcome: RpcOutcome, ttl: Option<Duration>) {
        let now = Instant::now();
        let next_allowed_at = outcome.next_allowed_at;
        let expires_at = match next_allowed_at {
            Some(next_allowed) => instant_at(next_allowed),
            None => now + ttl.unwrap_or(self.default_ttl),
        };
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let shared = futures::future::ready(Ok(outcome)).boxed().shared();

        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        entries.insert(
            key.flat(),
            CacheEntry {
                generation,
                payload: shared,
                created_at: now,
                expires_at,
                next_allowed_at,
            },
        );
    }

    /// Remove every entry whose flat key starts with `prefix_or_key`.
    /// Passing a full key removes exactly that entry; passing an
    /// environment-scoped method prefix removes every parameter variant.
    /// Returns the number of entries removed.
    pub fn invalidate(&self, prefix_or_key: &str) -> usize {
        let mut entries = self.entries.lock().expect("cache mutex poisoned");
        let before = entries.len();
        entries.retain(|flat, _| !flat.starts_with(prefix_or_key));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(prefix = %prefix_or_key, removed, "Invalidated cache entries");
        }
        removed
    }

    /// Freshness report for one key.
    pub fn info(&self, key: &CacheKey) -> CacheInfo {
        let entries = self.entries.lock().expect("cache mutex poisoned");
        let now = Instant::now();
        match entries.get(&key.flat()) {
            Some(entry) if entry.expires_at > now => {
                let next_allowed_at = entry.next_allowed_at.or_else(|| {
                    let remaining = entry.expires_at - now;
                    chrono::Duration::from_std(remaining)
                        .ok()
                        .map(|remaining| Utc::now() + remaining)
                });
                CacheInfo {
                    cached: true,
                    age: Some(now - entry.created_at),
                    next_allowed_at,
                }
            }
            _ => CacheInfo::miss(),
        }
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.entries.lock().expect("cache mutex poisoned").clear();
    }

    /// Number of entries, fresh or not, for diagnostics.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("cache mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
