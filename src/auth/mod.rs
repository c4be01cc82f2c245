//! Credential resolution
//!
//! The blob store authenticates every call with an opaque bearer token.
//! A token is resolved once per operation, either from an explicit option
//! or from a [`TokenResolver`] (by default the `BLOB_READ_WRITE_TOKEN`
//! environment variable). Nothing is cached across calls.
//!
//! # Example
//!
//! ```
//! use vercel_blob::auth::{StaticToken, TokenResolver};
//!
//! let resolver = StaticToken::new("vercel_blob_rw_store_secret");
//! let credential = resolver.resolve().unwrap();
//! assert_eq!(credential.bearer(), "Bearer vercel_blob_rw_store_secret");
//! ```

use crate::config::TOKEN_ENV_VAR;
use rand::Rng;
use std::fmt;
use thiserror::Error;

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),
}

/// Bearer token for a single request construction
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    /// Wrap a raw token, rejecting blank values
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(CredentialError::InvalidCredentials(
                "token cannot be empty".into(),
            ));
        }
        Ok(Self { token })
    }

    /// Raw token value
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the `authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Store id embedded in read-write tokens (`vercel_blob_rw_<store>_<secret>`)
    pub fn store_id(&self) -> &str {
        self.token.split('_').nth(3).unwrap_or("")
    }

    /// Request id in the `{storeId}:{unixMillis}:{randomHex}` form
    pub fn request_id(&self) -> String {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let random: u32 = rand::rng().random();
        format!("{}:{}:{:x}", self.store_id(), timestamp, random)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Source of default credentials when no explicit token is given
#[cfg_attr(test, mockall::automock)]
pub trait TokenResolver: Send + Sync {
    /// Resolve a credential for the current call
    fn resolve(&self) -> Result<Credential, CredentialError>;
}

/// Reads the token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvTokenResolver {
    var: String,
}

impl EnvTokenResolver {
    /// Resolver for `BLOB_READ_WRITE_TOKEN`
    pub fn new() -> Self {
        Self::with_var(TOKEN_ENV_VAR)
    }

    /// Resolver for a custom variable name
    pub fn with_var(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvTokenResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenResolver for EnvTokenResolver {
    fn resolve(&self) -> Result<Credential, CredentialError> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Credential::new(token),
            _ => Err(CredentialError::MissingCredentials(format!(
                "{} environment variable not set",
                self.var
            ))),
        }
    }
}

/// Fixed token, e.g. from configuration
#[derive(Debug, Clone)]
pub struct StaticToken {
    token: String,
}

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl TokenResolver for StaticToken {
    fn resolve(&self) -> Result<Credential, CredentialError> {
        Credential::new(self.token.clone())
    }
}
