//! Blob store client
//!
//! [`BlobClient`] is the public surface: `put` (single-shot or multipart),
//! `list`, `head`, `delete`, `copy` and `download_file`. Every call resolves
//! its credential first, so a missing token fails before any request leaves
//! the process.
//!
//! # Example
//!
//! ```no_run
//! use vercel_blob::blob::{BlobClient, PutOptions};
//! use vercel_blob::config::ClientConfig;
//!
//! # async fn example() -> Result<(), vercel_blob::BlobError> {
//! let client = BlobClient::new(ClientConfig::default())?;
//!
//! let blob = client
//!     .put("hello.txt", "Hello, World!", PutOptions::new().add_random_suffix(false))
//!     .await?;
//! println!("Uploaded to {}", blob.url);
//! # Ok(())
//! # }
//! ```

pub mod headers;
pub mod options;
pub mod types;

pub use headers::{guess_content_type, validate_pathname, WriteFlags, MAX_PATHNAME_LENGTH};
pub use options::{
    BlobUrls, CopyOptions, DownloadOptions, ListMode, ListOptions, PutOptions, RequestOptions,
    DEFAULT_CACHE_MAX_AGE, DEFAULT_LIST_LIMIT,
};
pub use types::{BlobDescriptor, HeadBlobResult, ListBlobResult, ListedBlob};

use crate::auth::{Credential, EnvTokenResolver, StaticToken, TokenResolver};
use crate::config::{ClientConfig, ConfigError};
use crate::error::BlobError;
use crate::request::{
    encode_component, ApiRequest, ApiResponse, HttpIssuer, RequestBody, RequestIssuer,
    RetryPolicy,
};
use crate::upload::{MultipartUploader, SinglePutHandler, UploadHandler, UploadTarget};
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use reqwest::{Method, Url};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::Span;

/// Blob store client
#[derive(Clone)]
pub struct BlobClient {
    config: ClientConfig,
    issuer: Arc<dyn RequestIssuer>,
    resolver: Arc<dyn TokenResolver>,
}

impl BlobClient {
    /// Create a client over HTTP.
    ///
    /// Uses `config.token` when set, otherwise reads `BLOB_READ_WRITE_TOKEN`
    /// on every call.
    pub fn new(config: ClientConfig) -> Result<Self, BlobError> {
        config.validate()?;

        let issuer = HttpIssuer::new(RetryPolicy::from(&config.retry))?;
        let resolver: Arc<dyn TokenResolver> = match &config.token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(EnvTokenResolver::new()),
        };

        Ok(Self {
            config,
            issuer: Arc::new(issuer),
            resolver,
        })
    }

    /// Replace the request issuer
    pub fn with_issuer(mut self, issuer: Arc<dyn RequestIssuer>) -> Self {
        self.issuer = issuer;
        self
    }

    /// Replace the default credential source
    pub fn with_token_resolver(mut self, resolver: Arc<dyn TokenResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn credential(&self, token: Option<&str>) -> Result<Credential, BlobError> {
        match token {
            Some(token) => Ok(Credential::new(token)?),
            None => Ok(self.resolver.resolve()?),
        }
    }

    /// Per-call override, falling back to the configured control timeout
    fn timeout(&self, per_call: Option<Duration>) -> Duration {
        per_call.unwrap_or_else(|| self.config.api.timeout())
    }

    fn api_version(&self) -> &str {
        &self.config.api.api_version
    }

    fn use_multipart(&self, options: &PutOptions, len: usize) -> bool {
        let by_size = self
            .config
            .upload
            .multipart_threshold
            .is_some_and(|threshold| len >= threshold);

        if !(options.multipart || by_size) {
            return false;
        }

        if len == 0 {
            tracing::debug!("Empty payload, using single-shot put instead of multipart");
            return false;
        }

        true
    }

    /// Upload `body` to `pathname`.
    ///
    /// Takes the multipart path when `options.multipart` is set or the
    /// payload reaches `upload.multipart_threshold`.
    #[tracing::instrument(
        name = "blob.put",
        skip(self, body, options),
        fields(
            pathname = %pathname,
            upload.bytes = tracing::field::Empty,
            upload.mode = tracing::field::Empty,
            blob.url = tracing::field::Empty
        ),
        err
    )]
    pub async fn put(
        &self,
        pathname: &str,
        body: impl Into<Bytes>,
        options: PutOptions,
    ) -> Result<BlobDescriptor, BlobError> {
        validate_pathname(pathname)?;

        if options.max_concurrent_uploads == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_concurrent_uploads must be at least 1".into(),
            )
            .into());
        }

        let credential = self.credential(options.token.as_deref())?;
        let headers = headers::write_headers(
            &credential,
            self.api_version(),
            pathname,
            &WriteFlags::from(&options),
        )?;

        let body: Bytes = body.into();
        let target = UploadTarget {
            base_url: self.config.base_url().to_string(),
            pathname: pathname.to_string(),
            headers,
            timeout: self.timeout(options.timeout),
        };

        let handler: Box<dyn UploadHandler> = if self.use_multipart(&options, body.len()) {
            let max_concurrent = options
                .max_concurrent_uploads
                .unwrap_or(self.config.upload.max_concurrent_uploads);
            Span::current().record("upload.mode", "multipart");
            let part_timeout = options
                .part_timeout
                .unwrap_or_else(|| self.config.upload.part_timeout());
            Box::new(
                MultipartUploader::new(Arc::clone(&self.issuer), &self.config.upload)
                    .max_concurrent_uploads(max_concurrent)
                    .part_timeout(part_timeout),
            )
        } else {
            Span::current().record("upload.mode", "single");
            Box::new(SinglePutHandler::new(Arc::clone(&self.issuer)))
        };

        Span::current().record("upload.bytes", body.len());

        let descriptor = handler
            .upload(&target, body, options.progress.clone())
            .await?;

        Span::current().record("blob.url", descriptor.url.as_str());
        Ok(descriptor)
    }

    /// Fetch one page of blobs
    #[tracing::instrument(
        name = "blob.list",
        skip(self, options),
        fields(prefix = ?options.prefix, blobs = tracing::field::Empty),
        err
    )]
    pub async fn list(&self, options: ListOptions) -> Result<ListBlobResult, BlobError> {
        let credential = self.credential(options.token.as_deref())?;
        let headers = headers::auth_headers(&credential, self.api_version())?;

        let mut url = format!(
            "{}/?limit={}",
            self.config.base_url(),
            options.limit.unwrap_or(DEFAULT_LIST_LIMIT)
        );
        if let Some(prefix) = options.prefix.as_deref().filter(|p| !p.is_empty()) {
            url.push_str(&format!("&prefix={}", encode_component(prefix)));
        }
        if let Some(cursor) = options.cursor.as_deref().filter(|c| !c.is_empty()) {
            url.push_str(&format!("&cursor={}", encode_component(cursor)));
        }
        if let Some(mode) = options.mode {
            url.push_str(&format!("&mode={}", mode.as_str()));
        }

        let request = ApiRequest::new("list", Method::GET, url)
            .headers(headers)
            .timeout(self.timeout(options.timeout));

        let page: ListBlobResult = self.issuer.issue(request).await?.into_json()?;

        Span::current().record("blobs", page.blobs.len());
        Ok(page)
    }

    /// Fetch metadata for one blob
    #[tracing::instrument(name = "blob.head", skip(self, options), fields(url = %url), err)]
    pub async fn head(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<HeadBlobResult, BlobError> {
        if url.trim().is_empty() {
            return Err(BlobError::InvalidInput("blob URL is required".into()));
        }

        let credential = self.credential(options.token.as_deref())?;
        let headers = headers::auth_headers(&credential, self.api_version())?;

        let request = ApiRequest::new(
            "head",
            Method::GET,
            format!("{}/?url={}", self.config.base_url(), encode_component(url)),
        )
        .headers(headers)
        .timeout(self.timeout(options.timeout));

        Ok(self.issuer.issue(request).await?.into_json()?)
    }

    /// Delete one or more blobs.
    ///
    /// Returns the service's JSON result, `null` when the body is empty.
    #[tracing::instrument(
        name = "blob.delete",
        skip(self, urls, options),
        fields(count = tracing::field::Empty),
        err
    )]
    pub async fn delete(
        &self,
        urls: impl Into<BlobUrls>,
        options: RequestOptions,
    ) -> Result<serde_json::Value, BlobError> {
        let urls = urls.into();
        urls.validate()?;
        Span::current().record("count", urls.len());

        let credential = self.credential(options.token.as_deref())?;
        let headers = headers::auth_headers(&credential, self.api_version())?;

        let request = ApiRequest::new(
            "delete",
            Method::POST,
            format!("{}/delete", self.config.base_url()),
        )
        .headers(headers)
        .body(RequestBody::Json(serde_json::json!({ "urls": urls.as_slice() })))
        .timeout(self.timeout(options.timeout));

        let result = self
            .issuer
            .issue(request)
            .await?
            .error_for_status()?
            .json_value()?;

        tracing::info!(count = urls.len(), "Deleted blobs");
        Ok(result)
    }

    /// Copy an existing blob to `to_pathname`
    #[tracing::instrument(
        name = "blob.copy",
        skip(self, options),
        fields(from_url = %from_url, to_pathname = %to_pathname, blob.url = tracing::field::Empty),
        err
    )]
    pub async fn copy(
        &self,
        from_url: &str,
        to_pathname: &str,
        options: CopyOptions,
    ) -> Result<BlobDescriptor, BlobError> {
        if from_url.trim().is_empty() {
            return Err(BlobError::InvalidInput("source URL is required".into()));
        }
        validate_pathname(to_pathname)?;

        let credential = self.credential(options.token.as_deref())?;
        let headers = headers::write_headers(
            &credential,
            self.api_version(),
            to_pathname,
            &WriteFlags::from(&options),
        )?;

        let request = ApiRequest::new(
            "copy",
            Method::PUT,
            format!(
                "{}/?pathname={}&fromUrl={}",
                self.config.base_url(),
                encode_component(to_pathname),
                encode_component(from_url)
            ),
        )
        .headers(headers)
        .timeout(self.timeout(options.timeout));

        let descriptor: BlobDescriptor = self.issuer.issue(request).await?.into_json()?;

        Span::current().record("blob.url", descriptor.url.as_str());
        Ok(descriptor)
    }

    /// Download a public blob into `dest_dir`, named after the last URL
    /// path segment. The directory must already exist.
    #[tracing::instrument(
        name = "blob.download",
        skip(self, dest_dir, options),
        fields(url = %url, dest = tracing::field::Empty, bytes = tracing::field::Empty),
        err
    )]
    pub async fn download_file(
        &self,
        url: &str,
        dest_dir: impl AsRef<Path>,
        options: DownloadOptions,
    ) -> Result<PathBuf, BlobError> {
        let dest_dir = dest_dir.as_ref();
        match tokio::fs::metadata(dest_dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(BlobError::file(
                    dest_dir,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a directory"),
                ))
            }
            Err(e) => return Err(BlobError::file(dest_dir, e)),
        }

        let mut download_url = Url::parse(url)
            .map_err(|e| BlobError::InvalidInput(format!("invalid blob URL '{}': {}", url, e)))?;
        let file_name = file_name_from_url(&download_url)?;
        download_url.query_pairs_mut().append_pair("download", "1");

        let path = dest_dir.join(file_name);
        Span::current().record("dest", path.display().to_string().as_str());

        let request = ApiRequest::new("download", Method::GET, download_url.as_str())
            .timeout(self.timeout(options.timeout));
        let response: ApiResponse = self.issuer.issue(request).await?.error_for_status()?;

        let len = response.body.len() as u64;
        if let Some(progress) = &options.progress {
            progress.start(len);
        }

        tokio::fs::write(&path, &response.body)
            .await
            .map_err(|e| BlobError::file(&path, e))?;

        if let Some(progress) = &options.progress {
            progress.advance(len);
            progress.finish();
        }

        Span::current().record("bytes", len);
        tracing::info!(path = %path.display(), bytes = len, "Downloaded blob");

        Ok(path)
    }
}

/// Last non-empty path segment, percent-decoded
fn file_name_from_url(url: &Url) -> Result<String, BlobError> {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let name = percent_decode_str(segment).decode_utf8_lossy().into_owned();

    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(BlobError::InvalidInput(format!(
            "cannot derive a file name from '{}'",
            url
        )));
    }

    Ok(name)
}
