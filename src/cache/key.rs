//! Cache keys and parameter canonicalization.
//!
//! A cache key is the tuple (method, environment, canonical parameters).
//! Canonicalization sorts object keys recursively, so two parameter sets
//! that differ only in property insertion order collide on the same key.

use serde_json::Value;

use crate::config::Environment;

/// Canonical JSON encoding: compact, with object keys sorted recursively.
pub fn canonical_json(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let body = keys
                .into_iter()
                .map(|key| {
                    format!(
                        "{}:{}",
                        Value::String(key.clone()),
                        canonical_json(&map[key])
                    )
                })
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        }
        Value::Array(items) => {
            let body = items.iter().map(canonical_json).collect::<Vec<_>>().join(",");
            format!("[{}]", body)
        }
        scalar => scalar.to_string(),
    }
}

/// Key identifying one logical read against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    environment: Environment,
    method: String,
    canonical_params: String,
}

impl CacheKey {
    pub fn new(environment: Environment, method: impl Into<String>, params: &Value) -> Self {
        Self {
            environment,
            method: method.into(),
            canonical_params: canonical_json(params),
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Flat string form, also the prefix-matching space for invalidation:
    /// `<environment>:<method>:<canonical-params>`.
    pub fn flat(&self) -> String {
        format!("{}:{}:{}", self.environment, self.method, self.canonical_params)
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.flat())
    }
}
