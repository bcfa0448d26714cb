//! The read-method allow-list and the mutation invalidation graph.
//!
//! Only the read methods the backend rate-limits pass through the cache.
//! Each mutating method declares the read-method prefixes whose cached
//! entries it renders stale on success; invalidation is prefix-based over
//! the environment-scoped key space because one mutation affects every
//! filter variant of a listing.

use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Read methods subject to the backend's minimum-reread interval.
const RATE_LIMITED_READS: [&str; 9] = [
    "accounts.list",
    "accounts.get",
    "beneficiaries.list",
    "beneficiaries.get",
    "transactions.list",
    "deals.list",
    "deals.get",
    "payments.list",
    "payments.get",
];

/// Mutating method -> read-method prefixes stale after a success.
static INVALIDATION_GRAPH: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        let mut graph: HashMap<&'static str, &'static [&'static str]> = HashMap::new();
        graph.insert("transfers.create", &["accounts.", "transactions."]);
        graph.insert("payments.create", &["accounts.", "transactions.", "payments."]);
        graph.insert("payments.cancel", &["payments."]);
        graph.insert("beneficiaries.create", &["beneficiaries."]);
        graph.insert("beneficiaries.update", &["beneficiaries."]);
        graph.insert("beneficiaries.delete", &["beneficiaries."]);
        graph.insert("virtualAccounts.create", &["accounts."]);
        graph.insert("virtualAccounts.close", &["accounts.", "transactions."]);
        graph.insert("deals.create", &["deals.", "accounts."]);
        graph.insert("deals.cancel", &["deals."]);
        graph
    });

/// Whether a method's responses go through the rate-limit cache.
pub fn is_rate_limited_read(method: &str) -> bool {
    RATE_LIMITED_READS.contains(&method)
}

/// Read-method prefixes a successful mutation invalidates. Empty for
/// methods with no declared effect on cached reads.
pub fn invalidation_prefixes(method: &str) -> &'static [&'static str] {
    INVALIDATION_GRAPH.get(method).copied().unwrap_or(&[])
}
