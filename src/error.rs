//! Crate-level error type
//!
//! Every client operation returns [`BlobError`]. Module errors convert into
//! it with `?`.

use crate::auth::CredentialError;
use crate::config::ConfigError;
use crate::progress::InvalidColorError;
use crate::request::RequestError;
use crate::upload::UploadError;
use std::path::PathBuf;
use thiserror::Error;

/// Client errors
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Configuration error: {0}")]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("File error at {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BlobError {
    /// Raised before any network call: bad settings or no credential
    pub fn is_config(&self) -> bool {
        matches!(self, BlobError::Config(_) | BlobError::Credential(_))
    }

    /// Remote status code, when the failure carried one
    pub fn status(&self) -> Option<u16> {
        let request = match self {
            BlobError::Request(e) => e,
            BlobError::Upload(UploadError::Request(e)) => e,
            BlobError::Upload(UploadError::PartFailed { source, .. }) => source,
            _ => return None,
        };

        match request {
            RequestError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BlobError::File {
            path: path.into(),
            source,
        }
    }
}

impl From<InvalidColorError> for BlobError {
    fn from(e: InvalidColorError) -> Self {
        BlobError::InvalidInput(e.to_string())
    }
}

/// Result alias for client operations
pub type Result<T, E = BlobError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_is_config_error() {
        let err: BlobError =
            CredentialError::MissingCredentials("BLOB_READ_WRITE_TOKEN not set".into()).into();
        assert!(err.is_config());
        assert!(err.to_string().contains("BLOB_READ_WRITE_TOKEN"));
    }

    #[test]
    fn test_status_from_part_failure() {
        let err: BlobError = UploadError::PartFailed {
            part_number: 2,
            source: RequestError::Api {
                status: 413,
                body: serde_json::Value::Null,
            },
        }
        .into();
        assert_eq!(err.status(), Some(413));
        assert!(!err.is_config());
    }

    #[test]
    fn test_file_error_names_path() {
        let err = BlobError::file(
            "/missing/dir",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory"),
        );
        assert!(err.to_string().contains("/missing/dir"));
    }
}
