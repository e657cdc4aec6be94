//! Retry policy for unreliable upstream boards
//!
//! Government boards time out and return 5xx often enough that every page
//! fetch is wrapped in a retry loop. The loop shape is data, not code: a
//! [`RetryPolicy`] is either bounded ("try N times, then give up") or
//! unbounded ("keep trying with a fixed delay until it works"), and both are
//! driven by [`with_retry`].

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// How many attempts a retry loop may make
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attempts {
    /// At most this many attempts in total (values below 1 count as 1)
    Bounded(u32),
    /// Retry until success or cancellation
    Unbounded,
}

/// Retry configuration: attempt budget plus a fixed delay between attempts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Attempt budget
    pub attempts: Attempts,

    /// Delay between two consecutive attempts, in milliseconds
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::bounded(5, Duration::from_secs(2))
    }
}

impl RetryPolicy {
    /// Give up after `max_attempts` attempts
    pub fn bounded(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: Attempts::Bounded(max_attempts),
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Keep retrying with a fixed delay until success or cancellation
    pub fn unbounded(delay: Duration) -> Self {
        Self {
            attempts: Attempts::Unbounded,
            delay_ms: delay.as_millis() as u64,
        }
    }

    /// Single attempt, no retry
    pub fn once() -> Self {
        Self::bounded(1, Duration::ZERO)
    }

    /// Delay between attempts
    #[must_use]
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Attempt cap, `None` when unbounded
    #[must_use]
    pub fn max_attempts(&self) -> Option<u32> {
        match self.attempts {
            Attempts::Bounded(n) => Some(n.max(1)),
            Attempts::Unbounded => None,
        }
    }

    /// Whether another attempt is allowed after `made` attempts
    #[must_use]
    pub fn allows(&self, made: u32) -> bool {
        self.max_attempts().map_or(true, |max| made < max)
    }
}

/// Run `operation` until it succeeds, the policy is exhausted, or `cancel` fires
///
/// The closure receives the 1-based attempt number. On exhaustion (or
/// cancellation after at least one attempt) the last error is returned; the
/// caller decides what a final failure means.
pub async fn with_retry<T, E, F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut attempt = 1;

    loop {
        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "Operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => {
                warn!(
                    attempt,
                    max_attempts = ?policy.max_attempts(),
                    error = %e,
                    "Attempt failed"
                );

                if !policy.allows(attempt) || cancel.is_cancelled() {
                    return Err(e);
                }

                debug!(attempt, delay_ms = policy.delay_ms, "Retrying after delay");
                tokio::select! {
                    () = tokio::time::sleep(policy.delay()) => {}
                    () = cancel.cancelled() => return Err(e),
                }
                attempt += 1;
            }
        }
    }
}
