//! JSON envelopes exchanged with the backend's RPC endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version the backend speaks.
pub const PROTOCOL_VERSION: &str = "2.0";

/// Outbound request envelope.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcRequest {
    pub protocol_version: String,
    pub method: String,
    pub params: Value,
    /// Fresh correlation id per request.
    pub id: String,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            protocol_version: PROTOCOL_VERSION.to_string(),
            method: method.into(),
            params,
            id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Inbound response envelope. Exactly one of `result` and `error` is
/// present in a well-formed response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcResponse {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RawRpcError>,
}

/// The backend's raw error object, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Successful outcome of a dispatched call.
#[derive(Debug, Clone)]
pub struct RpcOutcome {
    pub result: Value,
    /// Earliest moment the backend will serve the same read again, when it
    /// advertises one. The cache clamps entry expiry to this.
    pub next_allowed_at: Option<DateTime<Utc>>,
}

impl RpcOutcome {
    /// Lift the rate-limit hint out of the result payload so downstream
    /// consumers never parse business objects.
    pub fn from_result(result: Value) -> Self {
        let next_allowed_at = result
            .get("nextAllowedAt")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|parsed| parsed.with_timezone(&Utc));
        Self { result, next_allowed_at }
    }
}
