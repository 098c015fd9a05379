//! Retry policy.
//!
//! # Responsibilities
//! - Re-run an operation while it fails with a retryable error
//! - Invoke a refresh hook after each retryable failure
//! - Stop after `max_attempts` total attempts and surface the last error

use std::future::Future;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::error::TransportError;
use crate::resilience::backoff::calculate_backoff;

/// Classifies an error as worth another attempt.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for TransportError {
    fn is_retryable(&self) -> bool {
        TransportError::is_retryable(self)
    }
}

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Retry immediately, up to `max_attempts` attempts in total.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            max_attempts: config.retry,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
            max_delay: Duration::from_millis(config.retry_max_delay_ms),
        }
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.base_delay.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        )
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// `op` receives the 1-based attempt number. `on_failure` runs after every
    /// retryable failure, including the last one.
    pub async fn run<T, E, Op, Fut, Hook, HookFut>(&self, mut op: Op, mut on_failure: Hook) -> Result<T, E>
    where
        E: Retryable,
        Op: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        Hook: FnMut(u32, &E) -> HookFut,
        HookFut: Future<Output = ()>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => {
                    on_failure(attempt, &err).await;
                    if attempt >= attempts {
                        return Err(err);
                    }
                    let delay = self.delay_after(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::immediate(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool {
            matches!(self, TestError::Flaky)
        }
    }

    #[tokio::test]
    async fn test_fail_once_then_succeed() {
        let calls = AtomicU32::new(0);
        let hooks = AtomicU32::new(0);
        let result = RetryPolicy::default()
            .run(
                |attempt| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if attempt == 1 {
                            Err(TestError::Flaky)
                        } else {
                            Ok(attempt)
                        }
                    }
                },
                |_, _| {
                    hooks.fetch_add(1, Ordering::SeqCst);
                    async {}
                },
            )
            .await;
        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(hooks.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(3)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Flaky) }
                },
                |_, _| async {},
            )
            .await;
        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_stops_immediately() {
        let calls = AtomicU32::new(0);
        let hooks = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::immediate(5)
            .run(
                |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err(TestError::Fatal) }
                },
                |_, _| {
                    hooks.fetch_add(1, Ordering::SeqCst);
                    async {}
                },
            )
            .await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hooks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let policy = RetryPolicy::from_config(&GatewayConfig::default());
        assert_eq!(policy.max_attempts, 2);
        assert_eq!(policy.base_delay, Duration::ZERO);
    }
}
