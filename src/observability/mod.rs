//! # Observability
//!
//! Structured logging setup for the Fingate core using the tracing
//! ecosystem. The host process calls [`init_tracing`] once at startup;
//! the filter honors `RUST_LOG` and falls back to the given default.
//! Secret material never reaches a log line: everything sensitive travels
//! as [`crate::secrets::SecretString`], which redacts itself.

use crate::errors::{FingateError, Result};

/// Initialize the global tracing subscriber.
pub fn init_tracing(default_directive: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| FingateError::config(format!("Failed to initialize tracing: {}", e)))?;

    tracing::info!(
        app_name = crate::APP_NAME,
        version = crate::VERSION,
        "Fingate core logging initialized"
    );
    Ok(())
}
