//! # Idempotency Manager
//!
//! Guards money-moving mutations against duplicate execution. Each mutating
//! call derives an operation key from its semantically significant fields
//! only (never the token itself), and the manager maps that key to an
//! opaque token handed to the backend as the idempotency parameter.
//! Retries of the same business intent resolve to the same token, so the
//! backend collapses them into one financial effect.
//!
//! Tokens live in process memory only. A retry across a process restart is
//! a new logical attempt bounded by the backend's own idempotency window;
//! that is an accepted operational tradeoff.

use dashmap::DashMap;

use crate::errors::FingateError;

/// Process-wide map from operation key to idempotency token.
#[derive(Debug, Default)]
pub struct IdempotencyManager {
    tokens: DashMap<String, String>,
}

/// Operation key for a transfer between two virtual accounts.
/// `amount` is the canonical decimal string sent to the backend.
pub fn transfer_key(from_account: &str, to_account: &str, amount: &str) -> String {
    format!("transfer:{}:{}:{}", from_account, to_account, amount)
}

/// Operation key for a payout from a virtual account to an external
/// destination account number.
pub fn payout_key(source_account: &str, amount: &str, destination_number: &str) -> String {
    format!("payout:{}:{}:{}", source_account, amount, destination_number)
}

impl IdempotencyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the token for an operation key, minting a fresh one on first
    /// use. Repeated calls for the same key return the same token until it
    /// is retired.
    pub fn token_for(&self, operation_key: &str) -> String {
        self.tokens
            .entry(operation_key.to_string())
            .or_insert_with(|| uuid::Uuid::new_v4().to_string())
            .value()
            .clone()
    }

    /// Retire the token for an operation key, so the next attempt with the
    /// same business intent is a new operation.
    pub fn retire(&self, operation_key: &str) {
        if self.tokens.remove(operation_key).is_some() {
            tracing::debug!(operation_key = %operation_key, "Retired idempotency token");
        }
    }

    /// Apply the post-call lifecycle rule: success retires the token, and
    /// so does every failure except the idempotent-conflict code, where the
    /// token must survive so a later retry lands on the same in-flight
    /// operation instead of minting a new one.
    pub fn settle(&self, operation_key: &str, error: Option<&FingateError>) {
        match error {
            Some(e) if e.is_idempotent_conflict() => {
                tracing::debug!(
                    operation_key = %operation_key,
                    "Backend still processing; keeping idempotency token"
                );
            }
            _ => self.retire(operation_key),
        }
    }

    /// Number of live tokens, for diagnostics.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
