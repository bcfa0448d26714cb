//! # Fingate
//!
//! Fingate is the trust and transport core sitting between a treasury
//! operations dashboard and a remote financial JSON-RPC backend that
//! manages beneficiaries, virtual accounts, money-moving deals, and
//! payments.
//!
//! ## Architecture
//!
//! ```text
//! Dashboard / UI layer → Gateway → Rate-Limit Cache → Signed Dispatcher → Backend
//!                           ↓            ↓                  ↓
//!                    Idempotency    Invalidation      Credential Vault
//!                      Manager         Graph          + Key Validation
//! ```
//!
//! ## Core Components
//!
//! - **Credential Vault**: encrypted per-environment signing credentials on
//!   a local file store; keys are never persisted in plaintext
//! - **Key Material Validator**: structural and strength checks for
//!   uploaded or generated RSA keys and X.509 certificates
//! - **Signed Dispatcher**: signs and sends JSON envelopes and raw binary
//!   payloads under a hard deadline
//! - **Idempotency Manager**: one token per financial intent, so a retried
//!   transfer can never execute twice
//! - **Rate-Limit Cache**: coalescing TTL cache honoring the backend's
//!   minimum-reread interval, invalidated by mutations
//! - **Error Normalizer**: backend error codes mapped to a displayable,
//!   retry-aware taxonomy
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use fingate::{AppConfig, CredentialVault, Environment, Gateway};
//! use fingate::secrets::EnvSecretSource;
//!
//! #[tokio::main]
//! async fn main() -> fingate::Result<()> {
//!     let config = AppConfig::from_env()?;
//!     let vault = Arc::new(CredentialVault::new(
//!         config.keys_dir.clone(),
//!         Arc::new(EnvSecretSource::new()),
//!     ));
//!     let gateway = Gateway::new(config, vault)?;
//!
//!     let accounts = gateway
//!         .call_read(Environment::Pre, "accounts.list", serde_json::json!({}))
//!         .await?;
//!     println!("{}", accounts.result);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod idempotency;
pub mod keymat;
pub mod observability;
pub mod rpc;
pub mod secrets;
pub mod vault;

// Re-export commonly used types and traits
pub use cache::{CacheInfo, CacheKey, ResponseCache};
pub use config::{AppConfig, Environment, Profile};
pub use errors::{FingateError, Result};
pub use gateway::Gateway;
pub use idempotency::IdempotencyManager;
pub use observability::init_tracing;
pub use rpc::{ErrorDescriptor, SignedDispatcher};
pub use vault::{CredentialRecord, CredentialVault};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
