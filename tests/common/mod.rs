//! Shared helpers for integration tests: a provisioned vault with freshly
//! generated signing credentials and a config pointed at a local mock
//! backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use fingate::config::{AppConfig, Environment, EnvironmentConfig};
use fingate::errors::Result;
use fingate::keymat;
use fingate::secrets::{SecretSource, SecretString};
use fingate::vault::{CredentialRecord, CredentialVault};

pub struct FixedSource(pub &'static str);

impl SecretSource for FixedSource {
    fn master_passphrase(&self) -> Result<SecretString> {
        Ok(SecretString::new(self.0))
    }
}

pub struct TestContext {
    pub config: AppConfig,
    pub vault: Arc<CredentialVault>,
    /// Public half of the provisioned signing key, for signature checks.
    pub public_key_pem: String,
    pub thumbprint: String,
    // Held so the key files outlive the test.
    _keys_dir: tempfile::TempDir,
}

/// Build a config and a vault provisioned with fresh credentials for the
/// `pre` environment, pointing both endpoint URLs at `base_url`.
pub fn provisioned_context(base_url: &str, timeout: Duration) -> TestContext {
    let keys_dir = tempfile::tempdir().expect("create temp keys dir");

    let mut config = AppConfig::default();
    config.keys_dir = keys_dir.path().to_path_buf();
    config.request_timeout = timeout;
    config.environments.insert(
        Environment::Pre,
        EnvironmentConfig {
            rpc_url: format!("{}/rpc", base_url),
            upload_url: format!("{}/upload", base_url),
        },
    );

    let vault = Arc::new(CredentialVault::new(
        keys_dir.path(),
        Arc::new(FixedSource("integration-test-passphrase")),
    ));

    let pair = keymat::generate_key_pair().expect("generate signing key");
    let record = CredentialRecord {
        private_key: SecretString::new(pair.private_key_pem.expose_secret()),
        signing_system_id: "FINGATE-TEST-01".to_string(),
        signing_thumbprint: pair.thumbprint.clone(),
    };
    vault.save(Environment::Pre, &record).expect("save credentials");

    TestContext {
        config,
        vault,
        public_key_pem: pair.public_key_pem,
        thumbprint: pair.thumbprint,
        _keys_dir: keys_dir,
    }
}
