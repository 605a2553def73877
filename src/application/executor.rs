//! Resilient Request Executor
//!
//! Wraps adapter calls with a bounded number of attempts, a fixed delay
//! between attempts and a per-attempt timeout. Exhausted retries come back as
//! an [`ExecutionFailure`]; callers degrade to "no data", they never abort.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ports::SourceError;

/// Default number of attempts per call
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Default per-attempt timeout
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure after all attempts (or a non-retryable error)
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{operation} failed after {attempts} attempt(s): {last_error}")]
pub struct ExecutionFailure {
    pub operation: String,
    pub attempts: u32,
    pub last_error: SourceError,
}

impl ExecutionFailure {
    /// Whether the failure was transport-level (as opposed to bad data)
    pub fn is_transport(&self) -> bool {
        self.last_error.is_retryable()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

/// Telemetry hook for executor attempts
pub trait ExecutionObserver: Send + Sync {
    /// Called after every failed attempt
    fn on_attempt_failed(&self, operation: &str, attempt: u32, max_attempts: u32, error: &SourceError);

    /// Called once with the final outcome
    fn on_finished(&self, operation: &str, attempts: u32, result: Result<(), &SourceError>);
}

/// Observer that writes to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_attempt_failed(&self, operation: &str, attempt: u32, max_attempts: u32, error: &SourceError) {
        tracing::warn!(
            "{} request failed (attempt {}/{}): {}",
            operation,
            attempt,
            max_attempts,
            error
        );
    }

    fn on_finished(&self, operation: &str, attempts: u32, result: Result<(), &SourceError>) {
        match result {
            Ok(()) => tracing::debug!("{} succeeded after {} attempt(s)", operation, attempts),
            Err(e) => tracing::error!("All retries failed for {} ({} attempts): {}", operation, attempts, e),
        }
    }
}

/// Bounded-retry executor
pub struct ResilientExecutor {
    policy: RetryPolicy,
    observer: Box<dyn ExecutionObserver>,
}

impl Default for ResilientExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl ResilientExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_observer(policy, TracingObserver)
    }

    pub fn with_observer(policy: RetryPolicy, observer: impl ExecutionObserver + 'static) -> Self {
        let policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        Self {
            policy,
            observer: Box::new(observer),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `call` until it succeeds, fails non-retryably or runs out of attempts
    ///
    /// Sleeps `delay` between attempts but never after the last one.
    pub async fn execute<T, F, Fut>(&self, operation: &str, call: F) -> Result<T, ExecutionFailure>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, SourceError>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match tokio::time::timeout(self.policy.attempt_timeout, call()).await {
                Ok(Ok(value)) => {
                    self.observer.on_finished(operation, attempt, Ok(()));
                    return Ok(value);
                }
                Ok(Err(e)) => e,
                Err(_) => SourceError::Timeout(self.policy.attempt_timeout.as_millis() as u64),
            };

            self.observer.on_attempt_failed(operation, attempt, max_attempts, &error);

            if !error.is_retryable() || attempt >= max_attempts {
                self.observer.on_finished(operation, attempt, Err(&error));
                return Err(ExecutionFailure {
                    operation: operation.to_string(),
                    attempts: attempt,
                    last_error: error,
                });
            }

            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
