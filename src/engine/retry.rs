//! Deadline-bounded retries for transient failures.
//!
//! The executor re-runs an operation while it reports
//! [`CommandError::Transient`], sleeping with a capped exponential back-off
//! between attempts. Every other error propagates on first sight. Once the
//! deadline has passed, a transient failure becomes [`CommandError::Timeout`].
//!
//! Operations handed to the executor must be safe to run more than once; the
//! executor does not undo side effects of a failed attempt.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::CommandError;

/// Fallback when a deadline would overflow the clock.
const FAR_FUTURE: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// An absolute cutoff for one logical operation.
///
/// The instant is fixed at construction and shared by every attempt the
/// operation makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// A deadline `window` from now.
    #[must_use]
    pub fn after(window: Duration) -> Self {
        let now = Instant::now();
        Self(
            now.checked_add(window)
                .unwrap_or_else(|| now + FAR_FUTURE),
        )
    }

    /// A deadline at exactly `instant`.
    #[must_use]
    pub const fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Whether the current time is at or past the deadline.
    #[must_use]
    pub fn has_passed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Time left before the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// The underlying instant.
    #[must_use]
    pub const fn instant(&self) -> Instant {
        self.0
    }
}

/// Timing parameters for [`RetryExecutor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Window used when the caller supplies no deadline.
    pub default_window: Duration,
    /// Sleep before the second attempt.
    pub initial_backoff: Duration,
    /// Upper bound for any single sleep.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            default_window: Duration::from_secs(30),
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(2),
        }
    }
}

/// Re-runs operations that fail transiently until they succeed or time out.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
}

impl RetryExecutor {
    /// Create an executor with the given policy.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Return the active policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `attempt` until it succeeds, fails permanently, or `deadline`
    /// passes.
    ///
    /// `operation` names the work in timeout errors and logs. Each attempt
    /// receives the same deadline. When `deadline` is `None` the policy's
    /// default window applies.
    ///
    /// # Errors
    ///
    /// Returns the first non-transient error unchanged, or
    /// `CommandError::Timeout` when a transient failure is observed at or
    /// after the deadline.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        deadline: Option<Deadline>,
        mut attempt: F,
    ) -> Result<T, CommandError>
    where
        F: FnMut(Deadline) -> Fut,
        Fut: Future<Output = Result<T, CommandError>>,
    {
        let effective = deadline.unwrap_or_else(|| Deadline::after(self.policy.default_window));
        let mut backoff = self.policy.initial_backoff;
        let mut attempts: u32 = 0;

        loop {
            attempts = attempts.saturating_add(1);
            let error = match attempt(effective).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() => error,
                Err(error) => return Err(error),
            };

            if effective.has_passed() {
                debug!(operation, attempts, error = %error, "retry deadline exhausted");
                return Err(CommandError::Timeout {
                    operation: String::from(operation),
                    attempts,
                });
            }

            let pause = backoff.min(effective.remaining());
            warn!(
                operation,
                attempts,
                error = %error,
                backoff_ms = u64::try_from(pause.as_millis()).unwrap_or(u64::MAX),
                "transient failure; retrying"
            );
            tokio::time::sleep(pause).await;
            backoff = backoff.saturating_mul(2).min(self.policy.max_backoff);
        }
    }
}
