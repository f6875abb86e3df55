//! Shared helpers for adapters that touch contended OS resources.
//!
//! Record-file locks, device nodes and sysfs attributes can all be briefly
//! unavailable (another process mid-update, driver still probing after
//! boot). Each is retried a bounded number of times, never indefinitely.

use std::thread;
use std::time::Duration;

/// Bounded retry schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Three tries, 5 ms apart.
    pub const DEFAULT: Self = Self {
        attempts: 3,
        backoff: Duration::from_millis(5),
    };

    /// A single attempt with no waiting.
    pub const ONCE: Self = Self {
        attempts: 1,
        backoff: Duration::ZERO,
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// attempts are used up. Returns the last error in the failing cases.
pub(crate) fn retry<T, E>(
    policy: RetryPolicy,
    mut op: impl FnMut() -> Result<T, E>,
    retryable: impl Fn(&E) -> bool,
) -> Result<T, E> {
    let attempts = policy.attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if attempt < attempts && retryable(&e) => {
                attempt += 1;
                if !policy.backoff.is_zero() {
                    thread::sleep(policy.backoff);
                }
            }
            Err(e) => return Err(e),
        }
    }
}
