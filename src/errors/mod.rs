//! # Error Handling
//!
//! Error types for the Fingate trust and transport core, built on
//! `thiserror`. The taxonomy mirrors how callers are expected to react:
//! configuration errors are terminal, transport errors are retryable at the
//! caller's discretion, backend-declared errors carry a normalized
//! [`ErrorDescriptor`], and validation errors report the structural reason.

use crate::rpc::codes::ErrorDescriptor;

/// Custom result type for Fingate operations
pub type Result<T> = std::result::Result<T, FingateError>;

/// Main error type for the Fingate core
#[derive(thiserror::Error, Debug)]
pub enum FingateError {
    /// Configuration errors (missing credentials, bad profile, absent passphrase).
    /// Terminal: never retried automatically.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network transport errors: non-2xx status or connection failure.
    /// Carries the raw response where one was received.
    #[error("Transport error: {message}")]
    Transport {
        message: String,
        status: Option<u16>,
        body: Option<String>,
    },

    /// A call exceeded its hard deadline. Reported distinctly from generic
    /// transport failures so retry policy can treat it as such.
    #[error("Operation timed out: {operation} after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    /// An `error` object in an otherwise well-formed RPC response,
    /// normalized against the backend code table.
    #[error("Backend error {}: {}", .0.code, .0.title)]
    Backend(ErrorDescriptor),

    /// Key or certificate material failed a structural check.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A cryptographic operation failed. The message never contains key
    /// material or plaintext.
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// I/O errors with additional context
    #[error("I/O error: {context}")]
    Io {
        #[source]
        source: std::io::Error,
        context: String,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {context}")]
    Serialization {
        #[source]
        source: serde_json::Error,
        context: String,
    },
}

// Coalesced cache fetches fan a single outcome out to every waiting
// caller, so the error must be clonable. Source errors that are not
// `Clone` (io, serde) are rebuilt carrying the original kind and message.
impl Clone for FingateError {
    fn clone(&self) -> Self {
        match self {
            FingateError::Config(message) => FingateError::Config(message.clone()),
            FingateError::Transport { message, status, body } => FingateError::Transport {
                message: message.clone(),
                status: *status,
                body: body.clone(),
            },
            FingateError::Timeout { operation, duration_ms } => FingateError::Timeout {
                operation: operation.clone(),
                duration_ms: *duration_ms,
            },
            FingateError::Backend(descriptor) => FingateError::Backend(descriptor.clone()),
            FingateError::Validation(message) => FingateError::Validation(message.clone()),
            FingateError::Crypto(message) => FingateError::Crypto(message.clone()),
            FingateError::Io { source, context } => FingateError::Io {
                source: std::io::Error::new(source.kind(), source.to_string()),
                context: context.clone(),
            },
            FingateError::Serialization { source, context } => {
                use serde::de::Error;
                FingateError::Serialization {
                    source: serde_json::Error::custom(source.to_string()),
                    context: context.clone(),
                }
            }
        }
    }
}

impl FingateError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a transport error without a response
    pub fn transport<S: Into<String>>(message: S) -> Self {
        Self::Transport { message: message.into(), status: None, body: None }
    }

    /// Create a transport error carrying the raw HTTP response
    pub fn transport_status<S: Into<String>>(message: S, status: u16, body: String) -> Self {
        Self::Transport { message: message.into(), status: Some(status), body: Some(body) }
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(operation: S, duration_ms: u64) -> Self {
        Self::Timeout { operation: operation.into(), duration_ms }
    }

    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation(message.into())
    }

    /// Create a crypto error
    pub fn crypto<S: Into<String>>(message: S) -> Self {
        Self::Crypto(message.into())
    }

    /// Create an I/O error with context
    pub fn io<S: Into<String>>(source: std::io::Error, context: S) -> Self {
        Self::Io { source, context: context.into() }
    }

    /// Create a serialization error with context
    pub fn serialization<S: Into<String>>(source: serde_json::Error, context: S) -> Self {
        Self::Serialization { source, context: context.into() }
    }

    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            FingateError::Transport { .. } => true,
            FingateError::Timeout { .. } => true,
            FingateError::Backend(descriptor) => descriptor.is_retryable,
            _ => false,
        }
    }

    /// Whether the backend reported that a request with the same idempotency
    /// token is still being processed. This flag is the sole input the
    /// idempotency manager uses to decide whether a token survives a failure.
    pub fn is_idempotent_conflict(&self) -> bool {
        match self {
            FingateError::Backend(descriptor) => descriptor.is_idempotent_conflict,
            _ => false,
        }
    }
}
