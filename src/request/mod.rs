//! Request issuer
//!
//! Executes single HTTP calls against the blob API with bounded retries on
//! transient gateway errors. Everything above this layer talks to the
//! network through the [`RequestIssuer`] trait, so tests can swap in an
//! in-memory implementation.
//!
//! | Outcome | Behaviour |
//! |---------|-----------|
//! | 502 / 503 / 504 | retried, linear backoff |
//! | transport error (reset, timeout) | retried, linear backoff |
//! | any other status | returned as-is, caller inspects it |
//! | attempts exhausted | [`RequestError::Exhausted`] |

use async_trait::async_trait;
use bytes::Bytes;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

mod http;
mod retry;

pub use http::HttpIssuer;
pub use retry::{is_transient_status, Attempt, RetryPolicy};

/// Characters left as-is in query values and encoded headers
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a query value or header value
pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}

/// Request errors
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Request failed after {attempts} attempts: {reason}")]
    Exhausted { attempts: u32, reason: String },

    #[error("Blob API returned {status}: {body}")]
    Api {
        status: u16,
        body: serde_json::Value,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to build request: {0}")]
    Build(String),
}

/// Request payload
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Bytes(Bytes),
    Json(serde_json::Value),
}

impl RequestBody {
    /// Size of a raw byte body, zero otherwise
    pub fn len(&self) -> usize {
        match self {
            RequestBody::Bytes(bytes) => bytes.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fully assembled API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Short operation name used for spans and metrics
    pub operation: &'static str,
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub timeout: Duration,
}

impl ApiRequest {
    pub fn new(operation: &'static str, method: Method, url: impl Into<String>) -> Self {
        Self {
            operation,
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add one header, validating name and value
    pub fn header(mut self, name: &str, value: &str) -> Result<Self, RequestError> {
        let name = HeaderName::try_from(name)
            .map_err(|e| RequestError::Build(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| RequestError::Build(format!("invalid value for '{}': {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A response that made it past the retry layer
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Header value as a string, if present and valid UTF-8
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Body as loose JSON. An empty body is `null`.
    pub fn json_value(&self) -> Result<serde_json::Value, RequestError> {
        if self.body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| RequestError::InvalidResponse(format!("body is not JSON: {}", e)))
    }

    /// Fail on non-2xx, carrying the error payload
    pub fn error_for_status(self) -> Result<Self, RequestError> {
        if self.status.is_success() {
            return Ok(self);
        }

        let body = serde_json::from_slice(&self.body).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(&self.body).into_owned())
        });

        Err(RequestError::Api {
            status: self.status.as_u16(),
            body,
        })
    }

    /// Check the status and decode the body
    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, RequestError> {
        let response = self.error_for_status()?;
        serde_json::from_slice(&response.body)
            .map_err(|e| RequestError::InvalidResponse(format!("unexpected body: {}", e)))
    }
}

/// Configured HTTP request issuer with retry
#[async_trait]
pub trait RequestIssuer: Send + Sync {
    /// Execute a request. Only a usable response or a terminal error comes back.
    async fn issue(&self, request: ApiRequest) -> Result<ApiResponse, RequestError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn response(status: u16, body: &str) -> ApiResponse {
        ApiResponse::new(
            StatusCode::from_u16(status).unwrap(),
            HeaderMap::new(),
            Bytes::from(body.to_string()),
        )
    }

    #[test]
    fn test_into_json_success() {
        #[derive(Deserialize)]
        struct Body {
            url: String,
        }

        let body: Body = response(200, r#"{"url":"https://x"}"#).into_json().unwrap();
        assert_eq!(body.url, "https://x");
    }

    #[test]
    fn test_error_for_status_carries_json_body() {
        let err = response(403, r#"{"error":{"code":"forbidden"}}"#)
            .error_for_status()
            .unwrap_err();

        match err {
            RequestError::Api { status, body } => {
                assert_eq!(status, 403);
                assert_eq!(body["error"]["code"], "forbidden");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_error_for_status_keeps_text_body() {
        let err = response(500, "boom").error_for_status().unwrap_err();
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_json_value_empty_body_is_null() {
        assert!(response(200, "").json_value().unwrap().is_null());
    }

    #[test]
    fn test_encode_component() {
        assert_eq!(encode_component("a.txt"), "a.txt");
        assert_eq!(encode_component("dir/my file.txt"), "dir%2Fmy%20file.txt");
        assert_eq!(
            encode_component("https://x.io/a?b=1"),
            "https%3A%2F%2Fx.io%2Fa%3Fb%3D1"
        );
    }

    #[test]
    fn test_header_rejects_invalid_value() {
        let result = ApiRequest::new("put", Method::PUT, "http://x").header("x-test", "bad\nvalue");
        assert!(matches!(result, Err(RequestError::Build(_))));
    }
}
