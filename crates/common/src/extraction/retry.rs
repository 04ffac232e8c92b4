//! Bounded exponential backoff for rate-limited extraction calls

use super::ExtractionError;
use crate::errors::{AppError, Result};
use crate::metrics;
use std::future::Future;
use std::time::Duration;

/// Retry policy for extraction calls.
///
/// Only `ExtractionError::RateLimited` is retried. A reply that arrived but
/// carried no usable text becomes `ExtractionMalformed`. After the n-th (0-based)
/// rate-limited attempt the caller waits `base_delay * 2^n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the given 0-based attempt was rate limited
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2_u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempts are used up.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ExtractionError>>,
    {
        for attempt in 0..self.max_attempts {
            match op().await {
                Ok(value) => {
                    metrics::record_extraction_attempt("success");
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    metrics::record_extraction_attempt("rate_limited");
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Extraction service rate limited, backing off"
                    );
                    metrics::record_rate_limit_retry();
                    tokio::time::sleep(delay).await;
                }
                Err(e) if e.is_malformed_reply() => {
                    metrics::record_extraction_attempt("malformed");
                    tracing::warn!(attempt = attempt + 1, error = %e, "Extraction reply unusable");
                    return Err(AppError::ExtractionMalformed {
                        message: e.to_string(),
                    });
                }
                Err(e) => {
                    metrics::record_extraction_attempt("error");
                    tracing::error!(
                        attempt = attempt + 1,
                        error = %e,
                        "Extraction call failed"
                    );
                    return Err(AppError::ExtractionCall {
                        status: e.status(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(AppError::RetriesExhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn rate_limited() -> ExtractionError {
        ExtractionError::RateLimited { retry_after_secs: None }
    }

    fn assert_elapsed(start: Instant, expected: Duration) {
        let elapsed = start.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(50),
            "elapsed {:?}, expected {:?}",
            elapsed,
            expected
        );
    }

    #[test]
    fn test_delays_double() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_one_rate_limit() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result = RetryPolicy::default()
            .run(move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited())
                } else {
                    Ok("done")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_elapsed(start, Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_after_three_rate_limits() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = RetryPolicy::default()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(rate_limited())
            })
            .await;

        assert!(matches!(result, Err(AppError::RetriesExhausted { attempts: 3 })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_elapsed(start, Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_are_not_retried() {
        let calls = &AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = RetryPolicy::default()
            .run(move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ExtractionError::Api {
                    status: 400,
                    message: "bad request".to_string(),
                })
            })
            .await;

        match result {
            Err(AppError::ExtractionCall { status, .. }) => assert_eq!(status, Some(400)),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unusable_reply_is_malformed_without_retry() {
        for reply in [
            ExtractionError::EmptyResponse,
            ExtractionError::MalformedResponse("expected value at line 1".to_string()),
        ] {
            let calls = &AtomicU32::new(0);
            let reply = &reply;
            let start = Instant::now();

            let result: Result<()> = RetryPolicy::default()
                .run(move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(reply.clone())
                })
                .await;

            assert!(
                matches!(result, Err(AppError::ExtractionMalformed { .. })),
                "unexpected result: {:?}",
                result
            );
            assert_eq!(calls.load(Ordering::SeqCst), 1);
            assert!(start.elapsed() < Duration::from_millis(1));
        }
    }
}
