//! Pluggable origin of the master passphrase.
//!
//! The credential vault derives its per-file encryption keys from a single
//! master passphrase supplied once per process. Where that passphrase comes
//! from is a deployment decision, so it sits behind the [`SecretSource`]
//! trait: the default reads an environment variable, and a fixed
//! development fallback exists for local work but cannot be constructed
//! under the production profile.

use crate::config::Profile;
use crate::errors::{FingateError, Result};

use super::types::SecretString;

/// Environment variable the default source reads the passphrase from.
const PASSPHRASE_ENV_VAR: &str = "FINGATE_MASTER_PASSPHRASE";

/// Fixed development passphrase. Public by design; [`DevFallbackSource`]
/// refuses to exist outside the dev profile.
const DEV_FALLBACK_PASSPHRASE: &str = "fingate-dev-only-passphrase";

/// Source of the master passphrase protecting the credential vault.
pub trait SecretSource: Send + Sync {
    /// Retrieve the master passphrase. Absence is a terminal configuration
    /// error, not an excuse to fall back silently.
    fn master_passphrase(&self) -> Result<SecretString>;
}

/// Reads the master passphrase from `FINGATE_MASTER_PASSPHRASE`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretSource;

impl EnvSecretSource {
    pub fn new() -> Self {
        Self
    }
}

impl SecretSource for EnvSecretSource {
    fn master_passphrase(&self) -> Result<SecretString> {
        match std::env::var(PASSPHRASE_ENV_VAR) {
            Ok(value) if !value.is_empty() => Ok(SecretString::new(value)),
            _ => Err(FingateError::config(format!(
                "Master passphrase not set (expected {})",
                PASSPHRASE_ENV_VAR
            ))),
        }
    }
}

/// Development-only source returning a fixed, publicly known passphrase.
///
/// Construction fails under [`Profile::Production`] so a misconfigured
/// deployment cannot silently store production credentials under the
/// public passphrase.
#[derive(Debug, Clone)]
pub struct DevFallbackSource {
    _private: (),
}

impl DevFallbackSource {
    pub fn new(profile: Profile) -> Result<Self> {
        match profile {
            Profile::Dev => {
                tracing::warn!(
                    "Using the fixed development passphrase; vault files are NOT protected"
                );
                Ok(Self { _private: () })
            }
            Profile::Production => Err(FingateError::config(
                "The development fallback passphrase is refused outside the dev profile",
            )),
        }
    }
}

impl SecretSource for DevFallbackSource {
    fn master_passphrase(&self) -> Result<SecretString> {
        Ok(SecretString::new(DEV_FALLBACK_PASSPHRASE))
    }
}
