//! Bounded retry with exponential backoff and jitter.
//!
//! Provider calls are the only operations allowed to fail transiently.
//! Retryable errors (rate limits, transport failures) are retried up to a
//! configured budget with doubling delays plus jitter; everything else is
//! surfaced immediately. After the budget is spent the last error is
//! returned once, with its cause intact.

use crate::error::{NovaError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry budget for provider calls.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based), with up to 50% jitter.
    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay_ms.saturating_mul(1u64 << (attempt - 1).min(16));
        let jitter = rand::thread_rng().gen_range(0..=base / 2);
        Duration::from_millis(base + jitter)
    }
}

/// Run an async operation under the retry policy.
pub async fn with_retry<T, F, Fut>(policy: &RetryPolicy, op_name: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last_err = None;

    for attempt in 1..=attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                let delay = policy.delay(attempt);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    op_name, attempt, attempts, delay, e
                );
                tokio::time::sleep(delay).await;
                last_err = Some(e);
            }
            Err(e) => {
                // Retryable errors that exhausted the budget become a
                // terminal ProviderUnavailable with the cause attached.
                if e.is_retryable() {
                    return Err(NovaError::ProviderUnavailable(format!(
                        "{} failed after {} attempts: {}",
                        op_name, attempt, e
                    )));
                }
                return Err(e);
            }
        }
    }

    // Unreachable: the loop always returns. Kept for the type checker.
    Err(last_err.unwrap_or_else(|| {
        NovaError::ProviderUnavailable(format!("{} failed with no attempts made", op_name))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1,
        }
    }

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, NovaError>(42) }
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_rate_limit_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast_policy(), "op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(NovaError::RateLimited("quota".to_string()))
                } else {
                    Ok(7)
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(result, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_surfaces_terminal_error() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast_policy(), "embed", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(NovaError::RateLimited("quota".to_string())) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(err, NovaError::ProviderUnavailable(_)));
        assert!(err.to_string().contains("quota"));
    }

    #[tokio::test]
    async fn test_validation_errors_never_retried() {
        let calls = AtomicU32::new(0);
        let err = with_retry(&fast_policy(), "op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(NovaError::InvalidInput("empty".to_string())) }
        })
        .await
        .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, NovaError::InvalidInput(_)));
    }
}
