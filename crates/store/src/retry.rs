//! Retry policy with exponential backoff.
//!
//! Wraps an idempotent async operation in a bounded retry loop. Ingestion
//! batch writes use this; read paths never retry.

use mes_droits_core::AppResult;
use std::future::Future;
use std::time::Duration;

/// Bounded exponential backoff policy.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Wait before the first retry
    pub min_delay: Duration,

    /// Upper bound on any single wait
    pub max_delay: Duration,

    /// Factor applied to the delay after each failed attempt
    pub multiplier: u32,
}

impl RetryPolicy {
    /// Policy used for ingestion batch writes: up to 10 attempts, waits
    /// doubling from 30 s and capped at 120 s.
    pub fn ingestion() -> Self {
        Self {
            max_attempts: 10,
            min_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(120),
            multiplier: 2,
        }
    }

    /// Policy with no waiting, for tests.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            min_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 2,
        }
    }

    /// Delay before the retry following failed attempt `attempt` (1-based).
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(attempt.saturating_sub(1));
        self.min_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Run `op` until it succeeds or `max_attempts` is exhausted.
    ///
    /// Returns the last error once attempts are exhausted. The operation
    /// must be idempotent: every attempt repeats it in full.
    pub async fn run<T, F, Fut>(&self, op_name: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = AppResult<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= attempts => {
                    tracing::error!("{} failed after {} attempts: {}", op_name, attempt, e);
                    return Err(e);
                }
                Err(e) => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        op_name,
                        attempt,
                        attempts,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::ingestion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mes_droits_core::AppError;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_ingestion_policy_parameters() {
        let policy = RetryPolicy::ingestion();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.min_delay, Duration::from_secs(30));
        assert_eq!(policy.max_delay, Duration::from_secs(120));
        assert_eq!(policy.multiplier, 2);
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::ingestion();
        assert_eq!(policy.delay_for(1), Duration::from_secs(30));
        assert_eq!(policy.delay_for(2), Duration::from_secs(60));
        assert_eq!(policy.delay_for(3), Duration::from_secs(120));
        assert_eq!(policy.delay_for(4), Duration::from_secs(120));
        assert_eq!(policy.delay_for(9), Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let policy = RetryPolicy::immediate(10);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("test op", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 4 {
                        Err(AppError::Store("transient".to_string()))
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_exhausts_attempts() {
        let policy = RetryPolicy::immediate(3);
        let calls = AtomicU32::new(0);

        let result: AppResult<()> = policy
            .run("test op", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(AppError::Store("permanent".to_string())) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_success_needs_no_retry() {
        let policy = RetryPolicy::ingestion();
        // With the real 30 s minimum wait, a pass here proves no sleep ran.
        let result = policy.run("test op", || async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }
}
