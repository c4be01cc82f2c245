//! Multipart upload handler
//!
//! Three phases against the `/mpu` endpoint, selected by `x-mpu-action`:
//!
//! 1. `create` returns `uploadId` and the remote `key`
//! 2. `upload` sends every part, at most `max_concurrent` in flight
//! 3. `complete` submits `[{partNumber, etag}]` in ascending order
//!
//! The first failed part stops the pool. There is no remote abort call, so
//! a failed session is logged with its identifiers and left to expire.

use super::part::{MultipartSession, PartUploader};
use super::split::{split_parts, Chunk};
use super::{PartDescriptor, UploadError, UploadHandler, UploadTarget};
use crate::blob::types::BlobDescriptor;
use crate::config::UploadConfig;
use crate::metrics;
use crate::progress::ProgressObserver;
use crate::request::{encode_component, ApiRequest, RequestBody, RequestIssuer};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;

/// Lifecycle of one multipart upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    NotStarted,
    SessionCreated,
    PartsUploading,
    PartsComplete,
    Finalized,
    Aborted,
}

impl UploadState {
    /// Forward moves only; any live state may abort
    pub fn can_transition_to(self, next: UploadState) -> bool {
        use UploadState::*;
        matches!(
            (self, next),
            (NotStarted, SessionCreated)
                | (SessionCreated, PartsUploading)
                | (PartsUploading, PartsComplete)
                | (PartsComplete, Finalized)
                | (NotStarted, Aborted)
                | (SessionCreated, Aborted)
                | (PartsUploading, Aborted)
                | (PartsComplete, Aborted)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, UploadState::Finalized | UploadState::Aborted)
    }

    fn advance(&mut self, next: UploadState) -> Result<(), UploadError> {
        if !self.can_transition_to(next) {
            return Err(UploadError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        tracing::debug!(from = ?*self, to = ?next, "Multipart state change");
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    #[serde(default)]
    upload_id: Option<String>,
    #[serde(default)]
    key: Option<String>,
}

/// Multipart upload handler
pub struct MultipartUploader {
    issuer: Arc<dyn RequestIssuer>,
    part_size: usize,
    max_concurrent: usize,
    parts: PartUploader,
}

impl MultipartUploader {
    /// Create a new multipart handler
    pub fn new(issuer: Arc<dyn RequestIssuer>, config: &UploadConfig) -> Self {
        let parts = PartUploader::new(
            Arc::clone(&issuer),
            config.part_timeout(),
            config.missing_etag,
        );

        Self {
            issuer,
            part_size: config.part_size.max(1),
            max_concurrent: config.max_concurrent_uploads.max(1),
            parts,
        }
    }

    /// Override the worker bound
    pub fn max_concurrent_uploads(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Override the per-part timeout
    pub fn part_timeout(mut self, timeout: Duration) -> Self {
        self.parts = self.parts.with_timeout(timeout);
        self
    }

    pub fn part_size(&self) -> usize {
        self.part_size
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Initiate a multipart upload
    #[tracing::instrument(
        name = "blob.multipart.create",
        skip(self, target),
        fields(pathname = %target.pathname, upload_id = tracing::field::Empty),
        err
    )]
    pub async fn create(&self, target: &UploadTarget) -> Result<MultipartSession, UploadError> {
        let request = ApiRequest::new("create_multipart", Method::POST, target.mpu_url())
            .headers(target.headers.clone())
            .header("x-mpu-action", "create")?
            .timeout(target.timeout);

        let response: CreateResponse = self.issuer.issue(request).await?.into_json()?;

        let upload_id = response
            .upload_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| UploadError::InvalidSession("response has no uploadId".into()))?;
        let key = response
            .key
            .filter(|key| !key.is_empty())
            .ok_or_else(|| UploadError::InvalidSession("response has no key".into()))?;

        tracing::Span::current().record("upload_id", upload_id.as_str());
        tracing::info!(upload_id = %upload_id, key = %key, "Created multipart upload");

        Ok(MultipartSession { upload_id, key })
    }

    /// Upload every chunk through a bounded worker pool.
    ///
    /// Returns one descriptor per chunk, ordered by part number regardless
    /// of the order workers finished in.
    #[tracing::instrument(
        name = "blob.multipart.upload_parts",
        skip(self, target, session, chunks, progress),
        fields(
            upload_id = %session.upload_id,
            parts_count = chunks.len(),
            max_concurrent = self.max_concurrent
        ),
        err
    )]
    pub async fn upload_parts(
        &self,
        target: &UploadTarget,
        session: &MultipartSession,
        chunks: Vec<Chunk>,
        progress: Option<Arc<dyn ProgressObserver>>,
    ) -> Result<Vec<PartDescriptor>, UploadError> {
        let total = chunks.len();
        let mut slots: Vec<Option<PartDescriptor>> = vec![None; total];
        let mut pending = chunks.into_iter();
        let mut workers = JoinSet::new();

        let target = Arc::new(target.clone());
        let session = Arc::new(session.clone());

        loop {
            while workers.len() < self.max_concurrent {
                let Some(chunk) = pending.next() else {
                    break;
                };

                let parts = self.parts.clone();
                let target = Arc::clone(&target);
                let session = Arc::clone(&session);
                let progress = progress.clone();

                workers.spawn(async move {
                    parts
                        .upload_part(&target, &session, chunk, progress.as_deref())
                        .await
                });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };

            let part = match joined {
                Ok(Ok(part)) => part,
                Ok(Err(e)) => {
                    workers.shutdown().await;
                    return Err(e);
                }
                Err(e) => {
                    workers.shutdown().await;
                    return Err(UploadError::Worker(e.to_string()));
                }
            };

            let index = (part.part_number as usize).saturating_sub(1);
            match slots.get_mut(index) {
                Some(slot) => *slot = Some(part),
                None => {
                    workers.shutdown().await;
                    return Err(UploadError::Worker(format!(
                        "part number {} out of range",
                        part.part_number
                    )));
                }
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    UploadError::Worker(format!("part {} never completed", index + 1))
                })
            })
            .collect()
    }

    /// Complete a multipart upload
    #[tracing::instrument(
        name = "blob.multipart.complete",
        skip(self, target, session, parts),
        fields(upload_id = %session.upload_id, parts_count = parts.len()),
        err
    )]
    pub async fn complete(
        &self,
        target: &UploadTarget,
        session: &MultipartSession,
        parts: &[PartDescriptor],
    ) -> Result<BlobDescriptor, UploadError> {
        let mut ordered = parts.to_vec();
        ordered.sort_by_key(|part| part.part_number);

        let body = serde_json::to_value(&ordered)
            .map_err(|e| UploadError::InvalidSession(format!("cannot encode parts: {}", e)))?;

        let request = ApiRequest::new("complete_multipart", Method::POST, target.mpu_url())
            .headers(target.headers.clone())
            .header("x-mpu-action", "complete")?
            .header("x-mpu-upload-id", &session.upload_id)?
            .header("x-mpu-key", &encode_component(&session.key))?
            .body(RequestBody::Json(body))
            .timeout(target.timeout);

        let descriptor: BlobDescriptor = self.issuer.issue(request).await?.into_json()?;

        tracing::info!(
            upload_id = %session.upload_id,
            parts = ordered.len(),
            url = %descriptor.url,
            "Completed multipart upload"
        );

        Ok(descriptor)
    }

    async fn run(
        &self,
        target: &UploadTarget,
        chunks: Vec<Chunk>,
        progress: Option<Arc<dyn ProgressObserver>>,
        state: &mut UploadState,
        session: &mut Option<MultipartSession>,
    ) -> Result<BlobDescriptor, UploadError> {
        let created = self.create(target).await?;
        state.advance(UploadState::SessionCreated)?;
        let created = session.insert(created);

        state.advance(UploadState::PartsUploading)?;
        let parts = self.upload_parts(target, created, chunks, progress).await?;
        state.advance(UploadState::PartsComplete)?;

        let descriptor = self.complete(target, created, &parts).await?;
        state.advance(UploadState::Finalized)?;

        Ok(descriptor)
    }
}

#[async_trait]
impl UploadHandler for MultipartUploader {
    #[tracing::instrument(
        name = "blob.multipart",
        skip(self, target, body, progress),
        fields(
            pathname = %target.pathname,
            upload.bytes = body.len(),
            part_size = self.part_size,
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
        if body.is_empty() {
            return Err(UploadError::EmptyPayload);
        }

        let start_time = Instant::now();
        let bytes = body.len() as u64;
        let chunks = split_parts(&body, self.part_size);
        let parts_count = chunks.len();

        if let Some(progress) = &progress {
            progress.start(bytes);
        }

        let mut state = UploadState::NotStarted;
        let mut session = None;
        let result = self
            .run(target, chunks, progress.clone(), &mut state, &mut session)
            .await;

        metrics::record_upload_duration("multipart", start_time.elapsed().as_secs_f64());

        match result {
            Ok(descriptor) => {
                metrics::record_upload_success("multipart", bytes);
                metrics::record_multipart_upload_success(parts_count);
                if let Some(progress) = &progress {
                    progress.finish();
                }
                tracing::Span::current().record("url", descriptor.url.as_str());
                Ok(descriptor)
            }
            Err(e) => {
                metrics::record_upload_failure("multipart");
                metrics::record_multipart_upload_failure();
                metrics::record_error("multipart_upload");

                if let Some(session) = &session {
                    tracing::warn!(
                        upload_id = %session.upload_id,
                        key = %session.key,
                        state = ?state,
                        "Multipart upload failed, session left unfinished on the server"
                    );
                }
                if !state.is_terminal() {
                    state.advance(UploadState::Aborted)?;
                }

                Err(e)
            }
        }
    }
}
