//! # Gateway Facade
//!
//! Wires the core together the way callers use it: reads are consulted
//! against the rate-limit cache (coalescing concurrent identical requests
//! into one round trip), mutations dispatch directly and, on success, run
//! the invalidation graph and retire their idempotency token. Both
//! invalidation and retirement happen strictly after a confirmed success;
//! nothing depends on their relative order.

use std::sync::Arc;

use serde_json::Value;

use crate::cache::{invalidation_prefixes, is_rate_limited_read, CacheInfo, CacheKey, ResponseCache};
use crate::config::{AppConfig, Environment};
use crate::errors::{FingateError, Result};
use crate::idempotency::IdempotencyManager;
use crate::rpc::envelope::RpcOutcome;
use crate::rpc::SignedDispatcher;
use crate::vault::CredentialVault;

/// Parameter name carrying the idempotency token to the backend.
const IDEMPOTENCY_PARAM: &str = "idempotencyToken";

/// Entry point for callers: named backend methods in, outcomes out.
pub struct Gateway {
    dispatcher: Arc<SignedDispatcher>,
    cache: Arc<ResponseCache>,
    idempotency: Arc<IdempotencyManager>,
}

impl Gateway {
    pub fn new(config: AppConfig, vault: Arc<CredentialVault>) -> Result<Self> {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl));
        let dispatcher = Arc::new(SignedDispatcher::new(config, vault)?);
        Ok(Self::with_parts(dispatcher, cache, Arc::new(IdempotencyManager::new())))
    }

    /// Assemble a gateway from pre-built parts, e.g. a dispatcher with a
    /// custom signing strategy or a caller-owned cache instance.
    pub fn with_parts(
        dispatcher: Arc<SignedDispatcher>,
        cache: Arc<ResponseCache>,
        idempotency: Arc<IdempotencyManager>,
    ) -> Self {
        Self { dispatcher, cache, idempotency }
    }

    /// Invoke a read method. Rate-limited reads flow through the cache;
    /// anything else goes straight to the backend.
    pub async fn call_read(
        &self,
        environment: Environment,
        method: &str,
        params: Value,
    ) -> Result<RpcOutcome> {
        if !is_rate_limited_read(method) {
            return self.dispatcher.call(environment, method, params).await;
        }

        let key = CacheKey::new(environment, method, &params);
        let dispatcher = Arc::clone(&self.dispatcher);
        let method_owned = method.to_string();
        self.cache
            .get_or_fetch(&key, async move {
                dispatcher.call(environment, &method_owned, params).await
            })
            .await
    }

    /// Invoke a mutating method with no idempotency guard (reference-data
    /// edits). On success, cached reads the mutation affects are
    /// invalidated.
    pub async fn call_mutation(
        &self,
        environment: Environment,
        method: &str,
        params: Value,
    ) -> Result<RpcOutcome> {
        let outcome = self.dispatcher.call(environment, method, params).await?;
        self.apply_invalidation(environment, method);
        Ok(outcome)
    }

    /// Invoke a money-moving mutation under an idempotency token.
    ///
    /// `operation_key` must be derived from the operation's semantically
    /// significant fields only (see [`crate::idempotency::transfer_key`]
    /// and [`crate::idempotency::payout_key`]); retries with identical
    /// business intent then reuse the same token and the backend collapses
    /// them into one effect. The token is injected into `params` as
    /// `idempotencyToken`.
    pub async fn call_idempotent_mutation(
        &self,
        environment: Environment,
        method: &str,
        params: Value,
        operation_key: &str,
    ) -> Result<RpcOutcome> {
        let token = self.idempotency.token_for(operation_key);

        let mut params = params;
        match params.as_object_mut() {
            Some(map) => {
                map.insert(IDEMPOTENCY_PARAM.to_string(), Value::String(token));
            }
            None => {
                return Err(FingateError::validation(
                    "Idempotent mutations require object-shaped params",
                ))
            }
        }

        let result = self.dispatcher.call(environment, method, params).await;
        match &result {
            Ok(_) => {
                self.apply_invalidation(environment, method);
                self.idempotency.settle(operation_key, None);
            }
            Err(e) => self.idempotency.settle(operation_key, Some(e)),
        }
        result
    }

    /// Upload a raw binary payload (e.g. a supporting document) to a
    /// method-specific endpoint, signed over the exact bytes.
    pub async fn upload(
        &self,
        environment: Environment,
        endpoint: &str,
        payload: Vec<u8>,
        extra_headers: &[(String, String)],
    ) -> Result<Value> {
        self.dispatcher.call_binary(environment, endpoint, payload, extra_headers).await
    }

    /// Freshness report for one read, for operator display.
    pub fn cache_info(&self, environment: Environment, method: &str, params: &Value) -> CacheInfo {
        self.cache.info(&CacheKey::new(environment, method, params))
    }

    fn apply_invalidation(&self, environment: Environment, method: &str) {
        for prefix in invalidation_prefixes(method) {
            let scoped = format!("{}:{}", environment, prefix);
            let removed = self.cache.invalidate(&scoped);
            if removed > 0 {
                tracing::debug!(
                    method = %method,
                    prefix = %scoped,
                    removed,
                    "Mutation invalidated cached reads"
                );
            }
        }
    }
}
