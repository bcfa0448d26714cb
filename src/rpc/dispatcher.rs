//! # Signed Dispatcher
//!
//! Performs the actual network calls against the backend. Every call loads
//! the environment's credentials from the vault (lazily, never cached, so
//! a key rotation takes effect on the next call), signs the outbound
//! payload, attaches the signing metadata headers, and runs under a hard
//! deadline. Transport failures and backend-declared errors surface as
//! distinct error variants so callers can apply different retry policy.

use std::sync::Arc;

use serde_json::Value;

use crate::config::{AppConfig, Environment};
use crate::errors::{FingateError, Result};
use crate::vault::{CredentialRecord, CredentialVault};

use super::codes;
use super::envelope::{RpcOutcome, RpcRequest, RpcResponse};
use super::signing::{
    sign_bytes, RequestSigner, StaticEnvelopeSigner, HEADER_SIGNATURE, HEADER_SIGNING_SYSTEM,
    HEADER_THUMBPRINT,
};

/// Signing RPC client for the financial backend.
pub struct SignedDispatcher {
    config: AppConfig,
    vault: Arc<CredentialVault>,
    signer: Arc<dyn RequestSigner>,
    client: reqwest::Client,
}

impl SignedDispatcher {
    /// Create a dispatcher with the deployment's default envelope signing
    /// strategy.
    pub fn new(config: AppConfig, vault: Arc<CredentialVault>) -> Result<Self> {
        Self::with_signer(config, vault, Arc::new(StaticEnvelopeSigner::default()))
    }

    /// Create a dispatcher with an explicit envelope signing strategy.
    pub fn with_signer(
        config: AppConfig,
        vault: Arc<CredentialVault>,
        signer: Arc<dyn RequestSigner>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FingateError::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, vault, signer, client })
    }

    fn credentials(&self, environment: Environment) -> Result<CredentialRecord> {
        self.vault.load(environment)?.ok_or_else(|| {
            FingateError::config(format!(
                "No signing credentials configured for environment '{}'",
                environment
            ))
        })
    }

    fn timeout_ms(&self) -> u64 {
        self.config.request_timeout.as_millis() as u64
    }

    /// Dispatch a JSON RPC call.
    pub async fn call(
        &self,
        environment: Environment,
        method: &str,
        params: Value,
    ) -> Result<RpcOutcome> {
        let credentials = self.credentials(environment)?;
        let endpoint = self.config.environment(environment)?.rpc_url.clone();

        let request = RpcRequest::new(method, params);
        let body = serde_json::to_vec(&request)
            .map_err(|e| FingateError::serialization(e, "Failed to serialize RPC request"))?;
        let signature = self.signer.sign_envelope(&credentials, &body)?;

        tracing::debug!(
            environment = %environment,
            method = %method,
            correlation_id = %request.id,
            "Dispatching RPC call"
        );

        let response = self
            .client
            .post(&endpoint)
            .header("content-type", "application/json")
            .header(HEADER_SIGNATURE, signature)
            .header(HEADER_SIGNING_SYSTEM, &credentials.signing_system_id)
            .header(HEADER_THUMBPRINT, &credentials.signing_thumbprint)
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_send_error(method, e))?;

        let outcome = self.handle_rpc_response(method, response).await?;
        Ok(RpcOutcome::from_result(outcome))
    }

    /// Dispatch a raw binary payload (e.g. a document upload) to a
    /// method-specific endpoint under the environment's upload base URL.
    /// `endpoint` carries the path and any identifying query parameters;
    /// `extra_headers` carries caller-supplied metadata.
    pub async fn call_binary(
        &self,
        environment: Environment,
        endpoint: &str,
        payload: Vec<u8>,
        extra_headers: &[(String, String)],
    ) -> Result<Value> {
        let credentials = self.credentials(environment)?;
        let base = self.config.environment(environment)?.upload_url.clone();
        let url = format!("{}{}", base, endpoint);

        let signature = sign_bytes(&credentials, &payload)?;

        tracing::debug!(
            environment = %environment,
            endpoint = %endpoint,
            payload_len = payload.len(),
            "Dispatching binary upload"
        );

        let mut request = self
            .client
            .post(&url)
            .header("content-type", "application/octet-stream")
            .header(HEADER_SIGNATURE, signature)
            .header(HEADER_SIGNING_SYSTEM, &credentials.signing_system_id)
            .header(HEADER_THUMBPRINT, &credentials.signing_thumbprint);
        for (name, value) in extra_headers {
            request = request.header(name, value);
        }

        let response = request
            .body(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(endpoint, e))?;

        self.handle_rpc_response(endpoint, response).await
    }

    fn map_send_error(&self, operation: &str, error: reqwest::Error) -> FingateError {
        if error.is_timeout() {
            FingateError::timeout(operation, self.timeout_ms())
        } else {
            FingateError::transport(format!("Request failed: {}", error))
        }
    }

    /// Shared response handling: non-2xx is a transport failure carrying
    /// the raw body; an RPC `error` object is normalized; a well-formed
    /// `result` is returned as-is.
    async fn handle_rpc_response(
        &self,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FingateError::transport(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            tracing::warn!(operation = %operation, status = %status, "Backend returned non-2xx");
            return Err(FingateError::transport_status(
                format!("Backend returned HTTP {}", status),
                status.as_u16(),
                body,
            ));
        }

        let envelope: RpcResponse = serde_json::from_str(&body)
            .map_err(|e| FingateError::serialization(e, "Failed to parse RPC response"))?;

        if let Some(raw_error) = envelope.error {
            let descriptor = codes::normalize(&raw_error);
            tracing::warn!(
                operation = %operation,
                code = raw_error.code,
                title = %descriptor.title,
                "Backend declared an error"
            );
            return Err(FingateError::Backend(descriptor));
        }

        match envelope.result {
            Some(result) => Ok(result),
            None => Err(FingateError::transport(
                "RPC response contained neither result nor error",
            )),
        }
    }
}
