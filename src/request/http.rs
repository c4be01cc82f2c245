//! reqwest-backed request issuer

use super::retry::{is_transient_status, Attempt, RetryPolicy};
use super::{ApiRequest, ApiResponse, RequestBody, RequestError, RequestIssuer};
use crate::metrics;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

/// Request issuer over a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct HttpIssuer {
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HttpIssuer {
    /// Create a new issuer
    pub fn new(retry: RetryPolicy) -> Result<Self, RequestError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vercel-blob-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RequestError::Build(e.to_string()))?;

        Ok(Self { client, retry })
    }

    /// Reuse an existing client
    pub fn with_client(client: reqwest::Client, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn build(&self, request: &ApiRequest) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(request.method.clone(), &request.url)
            .headers(request.headers.clone())
            .timeout(request.timeout);

        match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Bytes(bytes) => builder.body(bytes.clone()),
            RequestBody::Json(value) => {
                let builder = if request.headers.contains_key(CONTENT_TYPE) {
                    builder
                } else {
                    builder.header(CONTENT_TYPE, "application/json")
                };
                builder.body(value.to_string())
            }
        }
    }

    async fn attempt(&self, request: &ApiRequest) -> Attempt {
        let response = match self.build(request).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Attempt::Fatal(RequestError::Build(e.to_string()));
            }
            Err(e) => return Attempt::Transient(e.to_string()),
        };

        let status = response.status();
        metrics::record_request(request.operation, status.as_u16());

        if is_transient_status(status.as_u16()) {
            return Attempt::Transient(format!("status {}", status.as_u16()));
        }

        let headers = response.headers().clone();
        match response.bytes().await {
            Ok(body) => Attempt::Done(ApiResponse::new(status, headers, body)),
            Err(e) => Attempt::Transient(format!("failed to read body: {}", e)),
        }
    }
}

#[async_trait]
impl RequestIssuer for HttpIssuer {
    #[tracing::instrument(
        name = "blob.http",
        skip(self, request),
        fields(
            blob.operation = request.operation,
            http.method = %request.method,
            http.url = %request.url,
            upload.bytes = request.body.len(),
            http.status_code = tracing::field::Empty
        ),
        err
    )]
    async fn issue(&self, request: ApiRequest) -> Result<ApiResponse, RequestError> {
        let response = self
            .retry
            .execute(request.operation, |_| self.attempt(&request))
            .await?;

        tracing::Span::current().record("http.status_code", response.status.as_u16());
        Ok(response)
    }
}
