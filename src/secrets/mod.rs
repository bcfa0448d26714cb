//! Handling of the master passphrase and other sensitive strings.
//!
//! Two concerns live here: [`SecretString`], a wrapper that keeps secret
//! values out of logs and serialized output, and [`SecretSource`], the
//! pluggable origin of the master passphrase the credential vault derives
//! its file keys from. Production deployments swap in a managed secret
//! store by implementing `SecretSource`; the vault itself never changes.

pub mod source;
pub mod types;

pub use source::{DevFallbackSource, EnvSecretSource, SecretSource};
pub use types::SecretString;
