//! Retry scheduling for remote operations.
//!
//! Given a failure category, [`RetryPolicy::for_kind`] decides whether the
//! operation is retried at all and with what delays. The policy itself never
//! sleeps; the transport drives the schedule.

use std::time::Duration;

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};

use crate::error::ErrorKind;

/// Initial backoff delay in milliseconds.
pub const INITIAL_BACKOFF_MS: u64 = 100;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 10_000;

/// Maximum retry attempts for a transient failure (attempts after the
/// first, so a call is tried at most `1 + MAX_RETRY_ATTEMPTS` times).
pub const MAX_RETRY_ATTEMPTS: usize = 3;

/// Configuration for retry operations.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of retry attempts.
    pub max_retries: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
            max_delay: Duration::from_millis(MAX_BACKOFF_MS),
            max_retries: MAX_RETRY_ATTEMPTS,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, max_retries: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            max_retries,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Build the exponential backoff schedule for this configuration:
    /// base `min_delay`, factor 2, capped at `max_delay`, at most
    /// `max_retries` delays.
    #[must_use]
    pub fn backoff(&self) -> ExponentialBackoff {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(2.0)
            .with_max_times(self.max_retries);

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder.build()
    }
}

/// The retry decision for one attempt sequence.
///
/// Produced once from the first observed failure and then driven to
/// exhaustion; it is not re-derived per attempt.
pub enum RetryPolicy {
    /// Fail immediately; retrying would deterministically fail the same way.
    No,
    /// Exponential backoff with jitter.
    Backoff(ExponentialBackoff),
    /// Server-directed delay for the first retry, exponential afterwards.
    After {
        delay: Duration,
        rest: ExponentialBackoff,
    },
}

impl RetryPolicy {
    /// Derive the policy for a failure category.
    ///
    /// Validation, parse, configuration, authentication, not-found and
    /// conflict failures are never retried. Network and timeout failures get
    /// the exponential schedule. Rate limits honor the server-supplied delay
    /// when present and fall back to the exponential schedule otherwise.
    #[must_use]
    pub fn for_kind(kind: &ErrorKind, config: &RetryConfig) -> Self {
        match kind {
            ErrorKind::Network { .. } | ErrorKind::Timeout { .. } => {
                RetryPolicy::Backoff(config.backoff())
            }
            ErrorKind::RateLimited { retry_after } => {
                let mut rest = config.backoff();
                match retry_after {
                    Some(delay) => {
                        // The explicit delay replaces the first scheduled
                        // slot so the attempt ceiling still holds.
                        if rest.next().is_none() {
                            return RetryPolicy::No;
                        }
                        RetryPolicy::After { delay: *delay, rest }
                    }
                    None => RetryPolicy::Backoff(rest),
                }
            }
            ErrorKind::AuthenticationFailed
            | ErrorKind::NotFound { .. }
            | ErrorKind::Validation { .. }
            | ErrorKind::Parse { .. }
            | ErrorKind::DataConflict { .. }
            | ErrorKind::Configuration { .. } => RetryPolicy::No,
        }
    }

    /// Next delay to sleep before retrying, or `None` when the operation
    /// should fail for good.
    pub fn next_delay(&mut self) -> Option<Duration> {
        match self {
            RetryPolicy::No => None,
            RetryPolicy::Backoff(schedule) => schedule.next(),
            RetryPolicy::After { delay, rest } => {
                let first = *delay;
                let rest = std::mem::replace(rest, ExponentialBuilder::default().build());
                *self = RetryPolicy::Backoff(rest);
                Some(first)
            }
        }
    }

    /// Whether this policy allows at least one retry.
    #[must_use]
    pub fn will_retry(&self) -> bool {
        !matches!(self, RetryPolicy::No)
    }
}
