//! Request header assembly and pathname checks

use super::options::{CopyOptions, PutOptions, DEFAULT_CACHE_MAX_AGE};
use crate::auth::Credential;
use crate::error::BlobError;
use crate::request::RequestError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Longest pathname the service accepts
pub const MAX_PATHNAME_LENGTH: usize = 950;

/// Reject pathnames the service would refuse
pub fn validate_pathname(pathname: &str) -> Result<(), BlobError> {
    if pathname.is_empty() {
        return Err(BlobError::InvalidInput("pathname is required".into()));
    }

    if pathname.chars().count() > MAX_PATHNAME_LENGTH {
        return Err(BlobError::InvalidInput(format!(
            "pathname is too long, maximum length is {}",
            MAX_PATHNAME_LENGTH
        )));
    }

    if pathname.contains("//") {
        return Err(BlobError::InvalidInput(
            "pathname cannot contain \"//\"".into(),
        ));
    }

    Ok(())
}

/// MIME type from the path extension, `application/octet-stream` otherwise
pub fn guess_content_type(pathname: &str) -> String {
    let path = pathname.split(['?', '#']).next().unwrap_or(pathname);
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<(), RequestError> {
    let value = HeaderValue::from_str(value)
        .map_err(|e| RequestError::Build(format!("invalid value for '{}': {}", name, e)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

/// Headers carried by every authenticated call
pub fn auth_headers(credential: &Credential, api_version: &str) -> Result<HeaderMap, BlobError> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, "authorization", &credential.bearer())?;
    insert(&mut headers, "x-api-version", api_version)?;
    insert(&mut headers, "x-api-blob-request-id", &credential.request_id())?;
    Ok(headers)
}

/// Write-side flags shared by `put`, multipart `put` and `copy`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteFlags {
    pub content_type: Option<String>,
    pub cache_control_max_age: Option<u64>,
    pub add_random_suffix: Option<bool>,
    pub allow_overwrite: bool,
}

impl From<&PutOptions> for WriteFlags {
    fn from(options: &PutOptions) -> Self {
        Self {
            content_type: options.content_type.clone(),
            cache_control_max_age: options.cache_control_max_age,
            add_random_suffix: options.add_random_suffix,
            allow_overwrite: options.allow_overwrite,
        }
    }
}

impl From<&CopyOptions> for WriteFlags {
    fn from(options: &CopyOptions) -> Self {
        Self {
            content_type: options.content_type.clone(),
            cache_control_max_age: options.cache_control_max_age,
            add_random_suffix: Some(options.add_random_suffix),
            allow_overwrite: options.allow_overwrite,
        }
    }
}

/// Authenticated headers plus the write-side ones for `pathname`
pub fn write_headers(
    credential: &Credential,
    api_version: &str,
    pathname: &str,
    flags: &WriteFlags,
) -> Result<HeaderMap, BlobError> {
    let mut headers = auth_headers(credential, api_version)?;

    let content_type = flags
        .content_type
        .clone()
        .unwrap_or_else(|| guess_content_type(pathname));
    let max_age = flags
        .cache_control_max_age
        .unwrap_or(DEFAULT_CACHE_MAX_AGE);

    insert(&mut headers, "access", "public")?;
    insert(&mut headers, "x-content-type", &content_type)?;
    insert(&mut headers, "x-cache-control-max-age", &max_age.to_string())?;

    match flags.add_random_suffix {
        Some(true) => insert(&mut headers, "x-add-random-suffix", "1")?,
        Some(false) => insert(&mut headers, "x-add-random-suffix", "0")?,
        None => {}
    }

    if flags.allow_overwrite {
        insert(&mut headers, "x-allow-overwrite", "1")?;
    }

    Ok(headers)
}
