//! Configuration module for the blob client
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation. Every section has
//! documented defaults so an empty document is a valid configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

/// Default API endpoint of the blob store
pub const DEFAULT_BASE_URL: &str = "https://blob.vercel-storage.com";

/// Protocol version sent in `x-api-version`
pub const DEFAULT_API_VERSION: &str = "7";

/// Environment variable holding the default bearer token
pub const TOKEN_ENV_VAR: &str = "BLOB_READ_WRITE_TOKEN";

/// Environment variable toggling debug logging
pub const DEBUG_ENV_VAR: &str = "VERCEL_BLOB_DEBUG";

/// Fixed multipart chunk size (5 MiB)
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

lazy_static::lazy_static! {
    static ref ENV_VAR_PATTERN: regex_lite::Regex =
        regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]+))?\}").unwrap();
}

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in ENV_VAR_PATTERN.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                // No env var and no default. Keep the original placeholder.
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);
    result
}

/// Validate that a URL starts with http:// or https://
fn is_valid_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Whether the debug logging toggle is set in the environment.
///
/// Any value other than empty, `0` or `false` enables it.
pub fn debug_enabled() -> bool {
    match std::env::var(DEBUG_ENV_VAR) {
        Ok(value) => {
            let value = value.trim().to_ascii_lowercase();
            !(value.is_empty() || value == "0" || value == "false")
        }
        Err(_) => false,
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main client configuration
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    /// Explicit bearer token. Takes precedence over the environment.
    #[serde(default)]
    pub token: Option<String>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api", &self.api)
            .field("retry", &self.retry)
            .field("upload", &self.upload)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Point the client at a different endpoint (mock servers, proxies)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.api.base_url = base_url.into();
        self
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.api.base_url.trim_end_matches('/')
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_http_url(&self.api.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "Invalid base_url '{}': must start with http:// or https://",
                self.api.base_url
            )));
        }

        if self.api.api_version.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api_version cannot be empty".into(),
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "timeout_seconds must be greater than 0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.upload.part_size < DEFAULT_PART_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "upload.part_size must be at least {} bytes, got {}",
                DEFAULT_PART_SIZE, self.upload.part_size
            )));
        }

        if self.upload.max_concurrent_uploads == 0 {
            return Err(ConfigError::ValidationError(
                "upload.max_concurrent_uploads must be at least 1".into(),
            ));
        }

        if self.upload.part_timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "upload.part_timeout_seconds must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Timeout for control calls (everything except part uploads)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

/// Retry configuration for the request issuer.
///
/// Only gateway errors (502/503/504) and transport failures are retried.
/// The wait before attempt `n + 1` is `backoff_factor_ms * n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts, including the first one. Default: 3
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Linear backoff factor in milliseconds. Default: 500
    #[serde(default = "default_backoff_factor_ms")]
    pub backoff_factor_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_factor_ms: default_backoff_factor_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_factor_ms() -> u64 {
    500
}

/// What to do when the service answers a part upload without an ETag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingEtagPolicy {
    /// Fail the part (and therefore the upload)
    #[default]
    Require,
    /// Fabricate a placeholder token and carry on
    Synthesize,
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_part_size")]
    pub part_size: usize,
    #[serde(default = "default_max_concurrent_uploads")]
    pub max_concurrent_uploads: usize,
    #[serde(default = "default_part_timeout_seconds")]
    pub part_timeout_seconds: u64,
    /// Payloads at least this large use multipart even when not flagged
    #[serde(default)]
    pub multipart_threshold: Option<usize>,
    #[serde(default)]
    pub missing_etag: MissingEtagPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
            max_concurrent_uploads: default_max_concurrent_uploads(),
            part_timeout_seconds: default_part_timeout_seconds(),
            multipart_threshold: None,
            missing_etag: MissingEtagPolicy::default(),
        }
    }
}

impl UploadConfig {
    pub fn part_timeout(&self) -> Duration {
        Duration::from_secs(self.part_timeout_seconds)
    }
}

fn default_part_size() -> usize {
    DEFAULT_PART_SIZE
}

fn default_max_concurrent_uploads() -> usize {
    5
}

fn default_part_timeout_seconds() -> u64 {
    30
}
