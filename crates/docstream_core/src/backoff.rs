//! Bounded retry with a fixed delay.

use crate::config::RetryConfig;
use std::fmt::Display;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Attempt bookkeeping for a retried operation.
///
/// Attempts are 1-based; `attempt() <= max_attempts()` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    max_attempts: u32,
    delay: Duration,
}

impl RetryState {
    fn first(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempt: 1,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// The attempt currently being made.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The attempt budget.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The delay inserted between attempts.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Attempts left after the current one.
    pub fn remaining(&self) -> u32 {
        self.max_attempts - self.attempt
    }

    /// Returns true if the current attempt is the last one allowed.
    pub fn is_last(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    fn advance(&mut self) {
        if !self.is_last() {
            self.attempt += 1;
        }
    }
}

/// The retry budget ran out; carries the error of the final attempt.
#[derive(Debug, Error)]
#[error("gave up after {attempts} attempts: {last_error}")]
pub struct RetryExhausted<E> {
    /// Number of attempts made.
    pub attempts: u32,
    /// Error returned by the final attempt.
    pub last_error: E,
}

/// Runs an operation up to a bounded number of times, sleeping a fixed
/// delay between attempts.
///
/// The executor is bound to a single operation by its owner; it has no
/// notion of which errors are retryable and retries every failure it sees.
/// Sleeping blocks the calling thread.
///
/// # Example
///
/// ```
/// use docstream_core::{BackoffExecutor, RetryConfig};
/// use std::time::Duration;
///
/// let executor = BackoffExecutor::new(RetryConfig::new(3).with_delay(Duration::ZERO));
/// let mut calls = 0;
/// let value = executor
///     .execute(|| {
///         calls += 1;
///         if calls < 3 { Err("not yet") } else { Ok(calls) }
///     })
///     .unwrap();
/// assert_eq!(value, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BackoffExecutor {
    config: RetryConfig,
}

impl BackoffExecutor {
    /// Creates an executor with the given policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the retry policy.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Runs `operation` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] with the last error if every attempt failed.
    pub fn execute<T, E, F>(&self, operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Display,
    {
        self.execute_with(operation, |_, _| {})
    }

    /// Like [`execute`](Self::execute), calling `on_retry` after every failed
    /// attempt that will be retried, before the delay.
    ///
    /// # Errors
    ///
    /// Returns [`RetryExhausted`] with the last error if every attempt failed.
    pub fn execute_with<T, E, F, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Result<T, E>,
        R: FnMut(&RetryState, &E),
        E: Display,
    {
        let mut state = RetryState::first(self.config.max_attempts, self.config.delay);

        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if state.is_last() => {
                    warn!(
                        attempts = state.attempt(),
                        error = %error,
                        "retry budget exhausted"
                    );
                    return Err(RetryExhausted {
                        attempts: state.attempt(),
                        last_error: error,
                    });
                }
                Err(error) => {
                    warn!(
                        attempt = state.attempt(),
                        max_attempts = state.max_attempts(),
                        delay_ms = state.delay().as_millis() as u64,
                        error = %error,
                        "attempt failed, retrying"
                    );
                    on_retry(&state, &error);
                    let delay = self.config.delay_for_attempt(state.attempt());
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                    state.advance();
                }
            }
        }
    }
}
