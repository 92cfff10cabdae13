//! Bounded retry with exponential backoff.
//!
//! The decision of what to do after a failed attempt is a pure transition
//! ([`RetryPolicy::on_failure`]) so it can be tested without sleeping.
//! [`execute`] drives that state machine around a single remote call.

use crate::error::{ErrorKind, PubmedError, Result};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// States of one retried call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// About to make attempt number `attempt` (1-based)
    Attempting { attempt: u32 },
    /// Sleeping `delay` before attempt `next_attempt`
    Backoff { next_attempt: u32, delay: Duration },
    /// The call returned a value on attempt `attempts`
    Succeeded { attempts: u32 },
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32 },
    /// A non-retryable error stopped the call
    Aborted { attempts: u32 },
}

impl RetryState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RetryState::Succeeded { .. } | RetryState::Exhausted { .. } | RetryState::Aborted { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    jitter: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; it is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            jitter: Duration::ZERO,
        }
    }

    /// Add up to `jitter` of uniform random delay to every backoff.
    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// `base_delay * 2^(attempt-1)`: base, 2x base, 4x base, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    pub fn on_success(&self, attempt: u32) -> RetryState {
        RetryState::Succeeded { attempts: attempt }
    }

    /// Transition after attempt number `attempt` failed with an error of `kind`.
    pub fn on_failure(&self, attempt: u32, kind: ErrorKind) -> RetryState {
        if !kind.is_retryable() {
            RetryState::Aborted { attempts: attempt }
        } else if attempt >= self.max_attempts {
            RetryState::Exhausted { attempts: attempt }
        } else {
            RetryState::Backoff {
                next_attempt: attempt + 1,
                delay: self.backoff_delay(attempt),
            }
        }
    }

    fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter.is_zero() {
            return delay;
        }
        let extra_ms = rand::thread_rng().gen_range(0..=self.jitter.as_millis() as u64);
        delay + Duration::from_millis(extra_ms)
    }
}

/// Run `operation` under `policy`.
///
/// Transport and service errors are retried; anything else is returned as-is
/// after the first failure. When attempts run out the last error is wrapped in
/// [`PubmedError::RetryExhausted`].
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, label: &str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        debug!(label, state = ?RetryState::Attempting { attempt }, "Calling");
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(label, state = ?policy.on_success(attempt), "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        match policy.on_failure(attempt, err.kind()) {
            RetryState::Backoff { next_attempt, delay } => {
                let delay = policy.jittered(delay);
                warn!(
                    label,
                    attempt,
                    max_attempts = policy.max_attempts,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, backing off"
                );
                tokio::time::sleep(delay).await;
                attempt = next_attempt;
            }
            RetryState::Exhausted { attempts } => {
                error!(label, attempts, error = %err, "Retries exhausted");
                return Err(PubmedError::RetryExhausted {
                    attempts,
                    last: Box::new(err),
                });
            }
            _ => {
                debug!(label, attempt, error = %err, "Non-retryable error, giving up");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn test_backoff_exponential() {
        let policy = RetryPolicy::new(5, Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_transitions() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(
            policy.on_failure(1, ErrorKind::Transport),
            RetryState::Backoff {
                next_attempt: 2,
                delay: Duration::from_millis(100)
            }
        );
        assert_eq!(
            policy.on_failure(2, ErrorKind::Service),
            RetryState::Backoff {
                next_attempt: 3,
                delay: Duration::from_millis(200)
            }
        );
        assert_eq!(
            policy.on_failure(3, ErrorKind::Transport),
            RetryState::Exhausted { attempts: 3 }
        );
        assert_eq!(
            policy.on_failure(1, ErrorKind::Parse),
            RetryState::Aborted { attempts: 1 }
        );
        assert!(policy.on_failure(1, ErrorKind::Other).is_terminal());
        assert!(!RetryState::Attempting { attempt: 1 }.is_terminal());
    }

    #[test]
    fn test_jittered_stays_within_bound() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1)).with_jitter(Duration::from_millis(250));
        for _ in 0..200 {
            let delay = policy.jittered(Duration::from_secs(1));
            assert!(delay >= Duration::from_secs(1));
            assert!(delay <= Duration::from_millis(1250));
        }
    }

    #[test]
    fn test_no_jitter_keeps_delay() {
        let policy = instant_policy(3);
        assert_eq!(policy.jittered(Duration::from_secs(4)), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_persistent_transport_error_exhausts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = execute(&instant_policy(4), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PubmedError::Transport("connection reset".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(PubmedError::RetryExhausted { attempts, last }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, PubmedError::Transport(_)));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_parse_error_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = execute(&instant_policy(4), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(PubmedError::Parse("garbage".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(PubmedError::Parse(_))));
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = execute(&instant_policy(3), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(PubmedError::Service {
                        code: 503,
                        message: "unavailable".into(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.ok(), Some(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_between_attempts() {
        let policy = RetryPolicy::new(3, Duration::from_secs(2));
        let start = tokio::time::Instant::now();
        let _: Result<()> = execute(&policy, "test", || async {
            Err(PubmedError::Transport("timeout".into()))
        })
        .await;
        // 2s + 4s of backoff, none after the final attempt
        assert_eq!(start.elapsed(), Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn test_jitter_added_to_backoff() {
        let policy = RetryPolicy::new(2, Duration::from_secs(2)).with_jitter(Duration::from_millis(500));
        let start = tokio::time::Instant::now();
        let _: Result<()> = execute(&policy, "test", || async {
            Err(PubmedError::Transport("timeout".into()))
        })
        .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "elapsed {:?}", elapsed);
        assert!(elapsed <= Duration::from_millis(2500), "elapsed {:?}", elapsed);
    }
}
