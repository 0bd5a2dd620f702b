//! Backoff Policy
//!
//! Pure mapping from attempt number to wait duration. The only side effect of
//! a retry loop is the sleep itself, which callers perform on tokio time.

use std::time::Duration;

/// Base delay for transaction-detail retries
pub const TX_DETAIL_BASE_DELAY: Duration = Duration::from_millis(4_000);

/// Growth factor applied per attempt for transaction-detail retries
pub const TX_DETAIL_GROWTH_FACTOR: f64 = 1.5;

/// Upper bound on a single transaction-detail retry wait
pub const TX_DETAIL_CAP_DELAY: Duration = Duration::from_millis(15_000);

/// Wait policy between two attempts of a retried call
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// `min(base * factor^attempt, cap)`
    Exponential {
        base: Duration,
        factor: f64,
        cap: Duration,
    },
    /// Same wait after every attempt
    Fixed(Duration),
}

impl Backoff {
    /// Policy used while waiting for a pool-creation transaction to be indexed
    pub fn transaction_details() -> Self {
        Backoff::Exponential {
            base: TX_DETAIL_BASE_DELAY,
            factor: TX_DETAIL_GROWTH_FACTOR,
            cap: TX_DETAIL_CAP_DELAY,
        }
    }

    /// Fixed wait in milliseconds (tradability retries)
    pub fn fixed_ms(millis: u64) -> Self {
        Backoff::Fixed(Duration::from_millis(millis))
    }

    /// Wait before the attempt following `attempt`.
    ///
    /// Monotonic non-decreasing in `attempt` as long as `factor >= 1.0`,
    /// and never above `cap`.
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Backoff::Exponential { base, factor, cap } => {
                let exponent = attempt.min(i32::MAX as u32) as i32;
                let scaled = base.as_secs_f64() * factor.powi(exponent);
                let capped = scaled.min(cap.as_secs_f64());
                Duration::from_secs_f64(capped.max(0.0))
            }
            Backoff::Fixed(delay) => delay,
        }
    }

    /// Longest wait this policy can produce
    pub fn max_delay(&self) -> Duration {
        match *self {
            Backoff::Exponential { cap, .. } => cap,
            Backoff::Fixed(delay) => delay,
        }
    }
}
