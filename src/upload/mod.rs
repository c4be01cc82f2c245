//! Upload module
//!
//! Two strategies sit behind the [`UploadHandler`] trait:
//!
//! - [`put_object::SinglePutHandler`]: one `PUT` with the whole payload
//! - [`multipart::MultipartUploader`]: create session, upload 5 MiB parts
//!   concurrently, complete session

use crate::blob::types::BlobDescriptor;
use crate::progress::ProgressObserver;
use crate::request::{encode_component, RequestError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub mod multipart;
pub mod part;
pub mod put_object;
pub mod split;

pub use multipart::{MultipartUploader, UploadState};
pub use part::{MultipartSession, PartUploader};
pub use put_object::SinglePutHandler;
pub use split::{split_parts, total_parts, Chunk};

/// Upload errors
#[derive(Error, Debug)]
pub enum UploadError {
    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("Invalid multipart session: {0}")]
    InvalidSession(String),

    #[error("Part {part_number} failed: {source}")]
    PartFailed {
        part_number: u32,
        #[source]
        source: RequestError,
    },

    #[error("Part {part_number} response carried no ETag")]
    MissingEtag { part_number: u32 },

    #[error("Invalid upload state transition from {from:?} to {to:?}")]
    InvalidTransition { from: UploadState, to: UploadState },

    #[error("Part worker failed: {0}")]
    Worker(String),

    #[error("Multipart upload needs a non-empty payload")]
    EmptyPayload,
}

/// Completed part info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartDescriptor {
    pub part_number: u32,
    pub etag: String,
}

/// Where and how a payload is uploaded
#[derive(Debug, Clone)]
pub struct UploadTarget {
    /// API base URL without trailing slash
    pub base_url: String,
    /// Requested pathname (unencoded)
    pub pathname: String,
    /// Authorization and upload headers shared by every call
    pub headers: HeaderMap,
    /// Timeout for control calls
    pub timeout: Duration,
}

impl UploadTarget {
    /// Single-shot endpoint
    pub fn put_url(&self) -> String {
        format!(
            "{}/?pathname={}",
            self.base_url,
            encode_component(&self.pathname)
        )
    }

    /// Multipart endpoint
    pub fn mpu_url(&self) -> String {
        format!(
            "{}/mpu?pathname={}",
            self.base_url,
            encode_component(&self.pathname)
        )
    }
}

/// Upload handler trait
#[async_trait]
pub trait UploadHandler: Send + Sync {
    /// Upload `body` to `target`
    async fn upload(
        &self,
        target: &UploadTarget,
        body: Bytes,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, UploadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(pathname: &str) -> UploadTarget {
        UploadTarget {
            base_url: "https://blob.example.com".into(),
            pathname: pathname.into(),
            headers: HeaderMap::new(),
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_target_urls() {
        let target = target("docs/a b.txt");
        assert_eq!(
            target.put_url(),
            "https://blob.example.com/?pathname=docs%2Fa%20b.txt"
        );
        assert_eq!(
            target.mpu_url(),
            "https://blob.example.com/mpu?pathname=docs%2Fa%20b.txt"
        );
    }

    #[test]
    fn test_part_descriptor_wire_format() {
        let part = PartDescriptor {
            part_number: 2,
            etag: "\"e2\"".into(),
        };
        let value = serde_json::to_value(&part).unwrap();
        assert_eq!(value, serde_json::json!({"partNumber": 2, "etag": "\"e2\""}));
    }
}
