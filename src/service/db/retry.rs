//! Generic retry harness for transient store failures.
//!
//! The policy knows nothing about what the operation does; it classifies
//! failures via [`AppError::is_retryable`], waits `base_delay * 2^(n-1)`
//! between attempts, and bounds the whole loop with a total timeout.

use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

use crate::service::db::core::transaction::IsolationLevel;
use crate::tool::error::AppError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub isolation: IsolationLevel,
    /// Bound on acquiring a transaction from the pool.
    pub acquire_timeout: Duration,
    /// Bound on the whole attempt loop, backoff waits included.
    pub total_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            isolation: IsolationLevel::Serializable,
            acquire_timeout: Duration::from_millis(5000),
            total_timeout: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.max_attempts == 0 {
            return Err(AppError::Configuration("retry max_attempts must be at least 1".into()));
        }
        if self.base_delay.is_zero() {
            return Err(AppError::Configuration("retry base_delay must be positive".into()));
        }
        if self.total_timeout.is_zero() || self.acquire_timeout.is_zero() {
            return Err(AppError::Configuration("retry timeouts must be positive".into()));
        }
        Ok(())
    }

    /// Exponential backoff before retrying after the given 1-based attempt.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs the operation until it succeeds, fails with a fatal error, or
    /// exhausts the attempt budget. Fatal and exhausted failures alike are
    /// wrapped as [`AppError::TransactionFailed`]; retry internals never
    /// leak to callers.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, AppError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let attempts = async {
            let mut attempt = 1u32;
            loop {
                match operation(attempt).await {
                    Ok(value) => return Ok(value),
                    Err(err) if err.is_retryable() && attempt < self.max_attempts => {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "transient failure, backing off before retry"
                        );
                        sleep(delay).await;
                        attempt += 1;
                    }
                    Err(err) => {
                        return Err(AppError::TransactionFailed(format!(
                            "gave up after {attempt} attempt(s): {err}"
                        )));
                    }
                }
            }
        };

        match timeout(self.total_timeout, attempts).await {
            Ok(result) => result,
            Err(_) => Err(AppError::TransactionFailed(format!(
                "timed out after {:?}",
                self.total_timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_delay(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_delay(3), Duration::from_millis(400));
    }

    #[test]
    fn zero_attempts_fail_validation() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(policy.validate().is_err());
    }
}
