//! Per-operation options
//!
//! Every field is optional; unset fields fall back to the client
//! configuration or the service default.

use crate::error::BlobError;
use crate::progress::ProgressObserver;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default `x-cache-control-max-age` (one year)
pub const DEFAULT_CACHE_MAX_AGE: u64 = 31_536_000;

/// Default `list` page size
pub const DEFAULT_LIST_LIMIT: u32 = 1000;

/// Options for `put`
#[derive(Clone, Default)]
pub struct PutOptions {
    /// Bearer token; falls back to the client's resolver
    pub token: Option<String>,
    /// `Some(false)` sends `x-add-random-suffix: 0`; `None` keeps the
    /// server-side suffixing
    pub add_random_suffix: Option<bool>,
    pub allow_overwrite: bool,
    /// Overrides the extension-based guess
    pub content_type: Option<String>,
    pub cache_control_max_age: Option<u64>,
    /// Force the multipart path
    pub multipart: bool,
    /// Worker bound for this call; falls back to the client configuration
    pub max_concurrent_uploads: Option<usize>,
    /// Timeout for control calls of this upload
    pub timeout: Option<Duration>,
    /// Timeout for each multipart part
    pub part_timeout: Option<Duration>,
    pub progress: Option<Arc<dyn ProgressObserver>>,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn add_random_suffix(mut self, enabled: bool) -> Self {
        self.add_random_suffix = Some(enabled);
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn cache_control_max_age(mut self, seconds: u64) -> Self {
        self.cache_control_max_age = Some(seconds);
        self
    }

    pub fn multipart(mut self, multipart: bool) -> Self {
        self.multipart = multipart;
        self
    }

    pub fn max_concurrent_uploads(mut self, max: usize) -> Self {
        self.max_concurrent_uploads = Some(max);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn part_timeout(mut self, timeout: Duration) -> Self {
        self.part_timeout = Some(timeout);
        self
    }

    pub fn progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(observer);
        self
    }
}

impl fmt::Debug for PutOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PutOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("add_random_suffix", &self.add_random_suffix)
            .field("allow_overwrite", &self.allow_overwrite)
            .field("content_type", &self.content_type)
            .field("cache_control_max_age", &self.cache_control_max_age)
            .field("multipart", &self.multipart)
            .field("max_concurrent_uploads", &self.max_concurrent_uploads)
            .field("timeout", &self.timeout)
            .field("part_timeout", &self.part_timeout)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// Listing format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMode {
    /// Every blob, folders flattened
    Expanded,
    /// Blobs inside a folder collapse into one folder entry
    Folded,
}

impl ListMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListMode::Expanded => "expanded",
            ListMode::Folded => "folded",
        }
    }
}

impl std::str::FromStr for ListMode {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expanded" => Ok(ListMode::Expanded),
            "folded" => Ok(ListMode::Folded),
            other => Err(BlobError::InvalidInput(format!(
                "list mode must be 'expanded' or 'folded', got '{}'",
                other
            ))),
        }
    }
}

/// Options for `list`
#[derive(Clone, Default)]
pub struct ListOptions {
    pub token: Option<String>,
    /// Page size, default 1000
    pub limit: Option<u32>,
    pub prefix: Option<String>,
    /// Cursor from a previous page
    pub cursor: Option<String>,
    pub mode: Option<ListMode>,
    pub timeout: Option<Duration>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn mode(mut self, mode: ListMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for ListOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("limit", &self.limit)
            .field("prefix", &self.prefix)
            .field("cursor", &self.cursor)
            .field("mode", &self.mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Options for `head` and `delete`
#[derive(Clone, Default)]
pub struct RequestOptions {
    pub token: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Options for `copy`. Unlike `put`, the random suffix is off unless asked for.
#[derive(Clone, Default)]
pub struct CopyOptions {
    pub token: Option<String>,
    pub add_random_suffix: bool,
    pub allow_overwrite: bool,
    pub content_type: Option<String>,
    pub cache_control_max_age: Option<u64>,
    pub timeout: Option<Duration>,
}

impl CopyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn add_random_suffix(mut self, enabled: bool) -> Self {
        self.add_random_suffix = enabled;
        self
    }

    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn cache_control_max_age(mut self, seconds: u64) -> Self {
        self.cache_control_max_age = Some(seconds);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for CopyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyOptions")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("add_random_suffix", &self.add_random_suffix)
            .field("allow_overwrite", &self.allow_overwrite)
            .field("content_type", &self.content_type)
            .field("cache_control_max_age", &self.cache_control_max_age)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Options for `download_file`
#[derive(Clone, Default)]
pub struct DownloadOptions {
    pub timeout: Option<Duration>,
    pub progress: Option<Arc<dyn ProgressObserver>>,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(observer);
        self
    }
}

impl fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("timeout", &self.timeout)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

/// One or more blob URLs, normalised to a list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobUrls(Vec<String>);

impl BlobUrls {
    /// Reject an empty list or blank entries
    pub fn validate(&self) -> Result<(), BlobError> {
        if self.0.is_empty() {
            return Err(BlobError::InvalidInput(
                "at least one blob URL is required".into(),
            ));
        }
        if self.0.iter().any(|url| url.trim().is_empty()) {
            return Err(BlobError::InvalidInput("blob URLs cannot be empty".into()));
        }
        Ok(())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BlobUrls {
    fn from(url: &str) -> Self {
        BlobUrls(vec![url.to_string()])
    }
}

impl From<String> for BlobUrls {
    fn from(url: String) -> Self {
        BlobUrls(vec![url])
    }
}

impl From<Vec<String>> for BlobUrls {
    fn from(urls: Vec<String>) -> Self {
        BlobUrls(urls)
    }
}

impl From<Vec<&str>> for BlobUrls {
    fn from(urls: Vec<&str>) -> Self {
        BlobUrls(urls.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for BlobUrls {
    fn from(urls: &[&str]) -> Self {
        BlobUrls(urls.iter().map(|u| u.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ByteCounter;

    #[test]
    fn test_single_url_normalised_to_list() {
        let urls = BlobUrls::from("https://x/a.txt");
        assert_eq!(urls.as_slice(), &["https://x/a.txt".to_string()]);
        assert!(urls.validate().is_ok());
    }

    #[test]
    fn test_empty_urls_rejected() {
        assert!(BlobUrls::from(Vec::<String>::new()).validate().is_err());
        assert!(BlobUrls::from(vec!["https://x/a", " "]).validate().is_err());
    }

    #[test]
    fn test_list_mode_parse() {
        assert_eq!("folded".parse::<ListMode>().unwrap(), ListMode::Folded);
        assert_eq!(ListMode::Expanded.as_str(), "expanded");
        assert!("sideways".parse::<ListMode>().is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let options = PutOptions::new()
            .token("vercel_blob_rw_store_secret")
            .progress(Arc::new(ByteCounter::new()));
        let debug = format!("{:?}", options);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("progress: true"));
    }

    #[test]
    fn test_copy_defaults_disable_suffix() {
        let options = CopyOptions::new();
        assert!(!options.add_random_suffix);
        assert!(!options.allow_overwrite);
    }
}
