//! # Configuration Management
//!
//! Environment-driven configuration for the Fingate core: per-environment
//! backend endpoints, the encrypted key store location, the outbound call
//! deadline, and the deployment profile that gates development-only
//! behavior.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{FingateError, Result};

/// A named deployment target of the financial backend, with its own
/// credentials and base URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Pre-production / staging
    Pre,
    /// Production
    Prod,
}

impl Environment {
    /// All known environments, in fixed order.
    pub fn all() -> [Environment; 2] {
        [Environment::Pre, Environment::Prod]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Pre => "pre",
            Environment::Prod => "prod",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = FingateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pre" => Ok(Environment::Pre),
            "prod" => Ok(Environment::Prod),
            other => Err(FingateError::config(format!("Unknown environment: {}", other))),
        }
    }
}

/// Deployment profile. Development-only conveniences (the fixed fallback
/// passphrase) are refused outside [`Profile::Dev`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Production,
}

impl FromStr for Profile {
    type Err = FingateError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dev" | "development" => Ok(Profile::Dev),
            "prod" | "production" => Ok(Profile::Production),
            other => Err(FingateError::config(format!("Unknown profile: {}", other))),
        }
    }
}

/// Per-environment backend endpoints.
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    /// RPC endpoint receiving the JSON envelope POSTs.
    pub rpc_url: String,
    /// Base URL for method-specific binary upload endpoints.
    pub upload_url: String,
}

/// Application configuration for the Fingate core
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Directory holding the `<environment>.keys.enc` files.
    pub keys_dir: PathBuf,
    /// Hard deadline for every outbound backend call.
    pub request_timeout: Duration,
    /// Default cache TTL; the backend's documented minimum-reread interval.
    pub cache_ttl: Duration,
    pub profile: Profile,
    pub environments: HashMap<Environment, EnvironmentConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut environments = HashMap::new();
        environments.insert(
            Environment::Pre,
            EnvironmentConfig {
                rpc_url: "https://gateway-pre.fingate.dev/rpc".to_string(),
                upload_url: "https://gateway-pre.fingate.dev/upload".to_string(),
            },
        );
        environments.insert(
            Environment::Prod,
            EnvironmentConfig {
                rpc_url: "https://gateway.fingate.dev/rpc".to_string(),
                upload_url: "https://gateway.fingate.dev/upload".to_string(),
            },
        );
        Self {
            keys_dir: PathBuf::from(".keys"),
            request_timeout: Duration::from_secs(15),
            cache_ttl: Duration::from_secs(300),
            profile: Profile::Production,
            environments,
        }
    }
}

impl AppConfig {
    /// Create configuration from environment variables, with defaults for
    /// anything unset.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("FINGATE_KEYS_DIR") {
            config.keys_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var("FINGATE_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| FingateError::config(format!("Invalid request timeout: {}", e)))?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("FINGATE_CACHE_TTL_SECS") {
            let secs: u64 = raw
                .parse()
                .map_err(|e| FingateError::config(format!("Invalid cache TTL: {}", e)))?;
            config.cache_ttl = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("FINGATE_PROFILE") {
            config.profile = raw.parse()?;
        }

        for environment in Environment::all() {
            let prefix = format!("FINGATE_{}", environment.as_str().to_uppercase());
            if let Some(entry) = config.environments.get_mut(&environment) {
                if let Ok(url) = std::env::var(format!("{}_RPC_URL", prefix)) {
                    entry.rpc_url = url;
                }
                if let Ok(url) = std::env::var(format!("{}_UPLOAD_URL", prefix)) {
                    entry.upload_url = url;
                }
            }
        }

        config.validate_endpoints()?;
        Ok(config)
    }

    /// Reject unparseable endpoint URLs at load time instead of at the
    /// first dispatched call.
    fn validate_endpoints(&self) -> Result<()> {
        for (environment, entry) in &self.environments {
            for (label, raw) in [("RPC", &entry.rpc_url), ("upload", &entry.upload_url)] {
                url::Url::parse(raw).map_err(|e| {
                    FingateError::config(format!(
                        "Invalid {} URL for environment '{}': {}",
                        label, environment, e
                    ))
                })?;
            }
        }
        Ok(())
    }

    /// Endpoint configuration for one environment.
    pub fn environment(&self, environment: Environment) -> Result<&EnvironmentConfig> {
        self.environments.get(&environment).ok_or_else(|| {
            FingateError::config(format!("No endpoints configured for environment '{}'", environment))
        })
    }
}
