//! Tracing subscriber setup
//!
//! ```text
//! Registry
//!   ├── EnvFilter (RUST_LOG, else --log-level, else VERCEL_BLOB_DEBUG)
//!   └── Fmt Layer (text or JSON, stderr)
//! ```

use crate::config::debug_enabled;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Logging setup errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("Failed to set global subscriber (may already be initialized): {0}")]
    AlreadyInitialized(String),
}

/// Subscriber options
#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter used when `RUST_LOG` is unset, e.g. `info` or `vercel_blob=debug`
    pub level: Option<String>,
    /// Emit one JSON object per event
    pub json: bool,
}

/// Filter directive used when neither `RUST_LOG` nor an explicit level is given
pub fn default_directive() -> &'static str {
    if debug_enabled() {
        "warn,vercel_blob=debug"
    } else {
        "warn"
    }
}

fn build_filter(options: &LoggingOptions) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directive = options
        .level
        .clone()
        .unwrap_or_else(|| default_directive().to_string());

    EnvFilter::try_new(&directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive,
        reason: e.to_string(),
    })
}

/// Install the global subscriber
pub fn init_subscriber(options: &LoggingOptions) -> Result<(), LoggingError> {
    let env_filter = build_filter(options)?;

    if options.json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer);

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;
    }

    Ok(())
}
