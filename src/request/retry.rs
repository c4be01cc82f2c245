//! Bounded linear retry

use super::{ApiResponse, RequestError};
use crate::config::RetryConfig;
use crate::metrics;
use std::future::Future;
use std::time::Duration;

/// Gateway statuses worth another attempt
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 502..=504)
}

/// Result of one attempt
#[derive(Debug)]
pub enum Attempt {
    /// Usable response, whatever its status
    Done(ApiResponse),
    /// Gateway error or transport failure; try again
    Transient(String),
    /// Give up immediately
    Fatal(RequestError),
}

/// Retry policy: `max_attempts` tries, waiting `backoff_factor * attempt`
/// between them.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_factor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_factor: Duration::from_millis(config.backoff_factor_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after a failed `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_factor * attempt
    }

    /// Drive `attempt_fn` until it yields a usable response or attempts run out
    pub async fn execute<F, Fut>(
        &self,
        operation: &str,
        mut attempt_fn: F,
    ) -> Result<ApiResponse, RequestError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Attempt>,
    {
        let mut last_reason = String::from("no attempt made");

        for attempt in 1..=self.max_attempts {
            match attempt_fn(attempt).await {
                Attempt::Done(response) => return Ok(response),
                Attempt::Fatal(err) => return Err(err),
                Attempt::Transient(reason) => {
                    tracing::warn!(
                        operation = operation,
                        attempt = attempt,
                        max_attempts = self.max_attempts,
                        reason = %reason,
                        "Request attempt failed"
                    );
                    last_reason = reason;

                    if attempt < self.max_attempts {
                        metrics::record_retry(operation);
                        tokio::time::sleep(self.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(RequestError::Exhausted {
            attempts: self.max_attempts,
            reason: last_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use reqwest::header::HeaderMap;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_factor: Duration::from_millis(1),
        }
    }

    fn ok() -> ApiResponse {
        ApiResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"{}"))
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient_status(502));
        assert!(is_transient_status(503));
        assert!(is_transient_status(504));
        assert!(!is_transient_status(500));
        assert!(!is_transient_status(429));
        assert!(!is_transient_status(200));
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute("test", |_| {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Attempt::Transient("status 503".into())
                    } else {
                        Attempt::Done(ok())
                    }
                }
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_always_failing_exhausts() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Attempt::Transient("status 503".into()) }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(RequestError::Exhausted { attempts, reason }) => {
                assert_eq!(attempts, 3);
                assert_eq!(reason, "status 503");
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fatal_stops_immediately() {
        let calls = AtomicU32::new(0);
        let result = fast_policy()
            .execute("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Attempt::Fatal(RequestError::Build("bad".into())) }
            })
            .await;

        assert!(matches!(result, Err(RequestError::Build(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
