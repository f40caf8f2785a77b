//! Retry policy for transient API failures.
//!
//! DESIGN
//! ======
//! The policy is pure: given what the last attempt produced and how many
//! retries have already happened, it answers "retry after N" or "stop".
//! `ApiClient` drives the loop; this module never touches the transport.

#[cfg(test)]
#[path = "retry_test.rs"]
mod retry_test;

use std::time::Duration;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// What a single attempt produced, as far as retrying is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
    Status(u16),
    NetworkFailure,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    Stop,
}

/// Fixed retry configuration: attempt budget, base delay, retryable statuses.
///
/// Delays double on every retry (`base_delay * 2^retry_count`) with no
/// jitter and no ceiling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            retryable_statuses: DEFAULT_RETRYABLE_STATUSES.to_vec(),
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self { max_retries: 0, ..Self::default() }
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        status != 401 && self.retryable_statuses.contains(&status)
    }

    /// Wait before retry number `retry_count + 1`.
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry_count))
    }

    /// Total attempts this policy allows for one request.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn decide(&self, attempt: Attempt, retry_count: u32) -> RetryDecision {
        let eligible = match attempt {
            Attempt::Status(status) => self.is_retryable_status(status),
            Attempt::NetworkFailure => true,
        };
        if eligible && retry_count < self.max_retries {
            RetryDecision::Retry(self.delay_for(retry_count))
        } else {
            RetryDecision::Stop
        }
    }
}
