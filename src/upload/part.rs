//! Part uploader
//!
//! Uploads one chunk of a multipart session and extracts its ETag, first
//! from the `etag` response header, then from the JSON body.

use super::split::Chunk;
use super::{PartDescriptor, UploadError, UploadTarget};
use crate::config::MissingEtagPolicy;
use crate::progress::ProgressObserver;
use crate::request::{encode_component, ApiRequest, ApiResponse, RequestBody, RequestIssuer};
use reqwest::Method;
use std::sync::Arc;
use std::time::Duration;

/// Session handle issued by the `create` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartSession {
    pub upload_id: String,
    /// Remote-assigned key, distinct from the requested pathname
    pub key: String,
}

/// Uploads single parts. Cheap to clone; one clone per worker.
#[derive(Clone)]
pub struct PartUploader {
    issuer: Arc<dyn RequestIssuer>,
    timeout: Duration,
    missing_etag: MissingEtagPolicy,
}

impl PartUploader {
    pub fn new(
        issuer: Arc<dyn RequestIssuer>,
        timeout: Duration,
        missing_etag: MissingEtagPolicy,
    ) -> Self {
        Self {
            issuer,
            timeout,
            missing_etag,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Upload a part
    #[tracing::instrument(
        name = "blob.multipart.upload_part",
        skip(self, target, session, chunk, progress),
        fields(
            upload_id = %session.upload_id,
            part_number = chunk.part_number,
            upload.bytes = chunk.len(),
            etag = tracing::field::Empty
        ),
        err
    )]
    pub async fn upload_part(
        &self,
        target: &UploadTarget,
        session: &MultipartSession,
        chunk: Chunk,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<PartDescriptor, UploadError> {
        let part_number = chunk.part_number;
        let bytes = chunk.len() as u64;

        let request = ApiRequest::new("upload_part", Method::POST, target.mpu_url())
            .headers(target.headers.clone())
            .header("x-mpu-action", "upload")?
            .header("x-mpu-upload-id", &session.upload_id)?
            .header("x-mpu-key", &encode_component(&session.key))?
            .header("x-mpu-part-number", &part_number.to_string())?
            .body(RequestBody::Bytes(chunk.bytes))
            .timeout(self.timeout);

        let response = self
            .issuer
            .issue(request)
            .await
            .and_then(ApiResponse::error_for_status)
            .map_err(|source| UploadError::PartFailed {
                part_number,
                source,
            })?;

        let etag = match extract_etag(&response) {
            Some(etag) => etag,
            None => self.fallback_etag(part_number)?,
        };

        tracing::Span::current().record("etag", etag.as_str());

        if let Some(progress) = progress {
            progress.advance(bytes);
        }

        tracing::debug!(part_number = part_number, size = bytes, "Uploaded part");

        Ok(PartDescriptor { part_number, etag })
    }

    fn fallback_etag(&self, part_number: u32) -> Result<String, UploadError> {
        match self.missing_etag {
            MissingEtagPolicy::Require => Err(UploadError::MissingEtag { part_number }),
            MissingEtagPolicy::Synthesize => {
                let etag = format!(
                    "synthetic-{}-{}",
                    part_number,
                    chrono::Utc::now().timestamp_millis()
                );
                tracing::warn!(
                    part_number = part_number,
                    etag = %etag,
                    "Part response carried no ETag, submitting a synthetic one"
                );
                Ok(etag)
            }
        }
    }
}

/// ETag from the `etag` header, else from the JSON body
pub(crate) fn extract_etag(response: &ApiResponse) -> Option<String> {
    if let Some(etag) = response.header_str("etag").filter(|e| !e.is_empty()) {
        return Some(etag.to_string());
    }

    let body: serde_json::Value = serde_json::from_slice(&response.body).ok()?;
    body.get("etag")
        .and_then(|e| e.as_str())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;

    fn response(headers: HeaderMap, body: &str) -> ApiResponse {
        ApiResponse::new(StatusCode::OK, headers, Bytes::from(body.to_string()))
    }

    #[test]
    fn test_etag_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert("etag", HeaderValue::from_static("\"from-header\""));
        let response = response(headers, r#"{"etag":"from-body"}"#);
        assert_eq!(extract_etag(&response).as_deref(), Some("\"from-header\""));
    }

    #[test]
    fn test_etag_from_body() {
        let response = response(HeaderMap::new(), r#"{"etag":"from-body"}"#);
        assert_eq!(extract_etag(&response).as_deref(), Some("from-body"));
    }

    #[test]
    fn test_etag_absent() {
        assert!(extract_etag(&response(HeaderMap::new(), "{}")).is_none());
        assert!(extract_etag(&response(HeaderMap::new(), "not json")).is_none());
        assert!(extract_etag(&response(HeaderMap::new(), r#"{"etag":""}"#)).is_none());
    }
}
