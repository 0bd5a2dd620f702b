//! Retry combinator
//!
//! One loop shared by every retried call: attempt cap, retry predicate and
//! [`Backoff`] policy are parameters. Sleeps happen on tokio time and race
//! the cancellation token, so a shutdown never waits out a backoff.

use std::fmt::Display;
use std::future::Future;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::domain::Backoff;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first one included; 0 is treated as 1
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self { max_attempts, backoff }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RetryError<E> {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("{0}")]
    Fatal(E),

    #[error("cancelled")]
    Cancelled,
}

/// Run `op` until it succeeds, fails with an error `should_retry` rejects,
/// or the attempt cap is reached.
///
/// `op` receives the zero-based attempt number.
pub async fn retry<T, E, F, Fut, P>(
    label: &str,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut op: F,
    should_retry: P,
) -> Result<T, RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 0..max_attempts {
        if cancel.is_cancelled() {
            return Err(RetryError::Cancelled);
        }

        tracing::debug!("{}: attempt {} of {}", label, attempt + 1, max_attempts);

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            result = op(attempt) => result,
        };

        let error = match result {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !should_retry(&error) {
            return Err(RetryError::Fatal(error));
        }

        if attempt + 1 >= max_attempts {
            tracing::warn!("{}: all {} attempts failed, last error: {}", label, max_attempts, error);
            return Err(RetryError::Exhausted {
                attempts: max_attempts,
                last: error,
            });
        }

        let delay = policy.backoff.delay(attempt);
        tracing::warn!(
            "{}: attempt {} failed ({}), retrying in {:.1}s",
            label,
            attempt + 1,
            error,
            delay.as_secs_f64()
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }

    // max_attempts >= 1 means the loop always returns
    Err(RetryError::Cancelled)
}
