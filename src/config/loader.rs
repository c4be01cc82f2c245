//! Configuration loader with environment variable expansion

use super::{expand_env_vars, ClientConfig, ConfigError};
use std::path::Path;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a YAML document, expanding `${VAR}` / `${VAR:-default}` first
    pub fn parse(content: &str) -> Result<ClientConfig, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: ClientConfig = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissingEtagPolicy;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    #[serial]
    fn test_parse_expands_env_vars() {
        std::env::set_var("VERCEL_BLOB_TEST_BASE", "http://127.0.0.1:4000");
        let config = ConfigLoader::parse(
            r#"
api:
  base_url: "${VERCEL_BLOB_TEST_BASE}"
upload:
  max_concurrent_uploads: 3
  missing_etag: synthesize
"#,
        )
        .unwrap();
        std::env::remove_var("VERCEL_BLOB_TEST_BASE");

        assert_eq!(config.base_url(), "http://127.0.0.1:4000");
        assert_eq!(config.upload.max_concurrent_uploads, 3);
        assert_eq!(config.upload.missing_etag, MissingEtagPolicy::Synthesize);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_parse_empty_document_uses_defaults() {
        let config = ConfigLoader::parse("{}").unwrap();
        assert_eq!(config.api.timeout_seconds, 10);
        assert_eq!(config.upload.part_timeout_seconds, 30);
        assert!(config.upload.multipart_threshold.is_none());
    }

    #[test]
    fn test_parse_rejects_invalid_values() {
        let result = ConfigLoader::parse("retry:\n  max_attempts: 0\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api:\n  timeout_seconds: 4").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.api.timeout_seconds, 4);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ConfigLoader::load("/definitely/not/here.yaml");
        assert!(matches!(result, Err(ConfigError::IoError(_))));
    }
}
