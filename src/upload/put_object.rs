//! Single-shot upload handler
//!
//! Sends the whole payload in one `PUT {base}/?pathname=...` call.

use super::{UploadError, UploadHandler, UploadTarget};
use crate::blob::types::BlobDescriptor;
use crate::metrics;
use crate::progress::ProgressObserver;
use crate::request::{ApiRequest, RequestBody, RequestIssuer};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use std::sync::Arc;
use std::time::Instant;

/// Simple upload handler
pub struct SinglePutHandler {
    issuer: Arc<dyn RequestIssuer>,
}

impl SinglePutHandler {
    pub fn new(issuer: Arc<dyn RequestIssuer>) -> Self {
        Self { issuer }
    }
}

#[async_trait]
impl UploadHandler for SinglePutHandler {
    #[tracing::instrument(
        name = "blob.put_object",
        skip(self, target, body, progress),
        fields(
            pathname = %target.pathname,
            upload.bytes = body.len(),
            url = tracing::field::Empty
        ),
        err
    )]
    async fn upload(
        &self,
        target: &UploadTarget,
        body: Bytes,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<BlobDescriptor, UploadError> {
        let bytes_written = body.len() as u64;
        let start_time = Instant::now();

        if let Some(progress) = &progress {
            progress.start(bytes_written);
        }

        let request = ApiRequest::new("put", Method::PUT, target.put_url())
            .headers(target.headers.clone())
            .body(RequestBody::Bytes(body))
            .timeout(target.timeout);

        let result = match self.issuer.issue(request).await {
            Ok(response) => response.into_json::<BlobDescriptor>(),
            Err(e) => Err(e),
        };

        let duration = start_time.elapsed();
        metrics::record_upload_duration("put", duration.as_secs_f64());

        match result {
            Ok(descriptor) => {
                metrics::record_upload_success("put", bytes_written);

                if let Some(progress) = &progress {
                    progress.advance(bytes_written);
                    progress.finish();
                }

                tracing::Span::current().record("url", descriptor.url.as_str());
                tracing::info!(
                    url = %descriptor.url,
                    bytes_written = bytes_written,
                    duration_ms = duration.as_millis(),
                    "Put completed"
                );

                Ok(descriptor)
            }
            Err(e) => {
                metrics::record_upload_failure("put");
                metrics::record_error("put");

                tracing::error!(
                    error = %e,
                    duration_ms = duration.as_millis(),
                    "Put failed"
                );

                Err(e.into())
            }
        }
    }
}
