//! Retry controller around a connector's retrieval call.
//!
//! A retrieval attempt either succeeds, fails fatally (the failure kind is
//! not retriable and propagates immediately), or fails retriably and is
//! re-attempted after a backoff sleep until the attempt budget runs out. On
//! exhaustion the last failure propagates unchanged so callers can inspect
//! the original kind.

use crate::error::ConnectorError;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Framework default attempt budget.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Framework default base delay between attempts.
pub const DEFAULT_BASE_DELAY_MS: u64 = 500;

/// Exponential backoff: base delay doubled on each attempt, capped at 64x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_delay_ms: u64,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
        }
    }
}

impl Backoff {
    /// Delay to sleep after failed attempt number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(6);
        Duration::from_millis(self.base_delay_ms * (1 << doublings))
    }

    /// A backoff that never sleeps.
    pub fn none() -> Self {
        Self { base_delay_ms: 0 }
    }
}

/// How many times to attempt a retrieval, and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: Backoff::default(),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    pub fn no_backoff(mut self) -> Self {
        self.backoff = Backoff::none();
        self
    }
}

/// The retry behavior a connector selects at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryStrategy {
    /// Use the framework default policy.
    #[default]
    Default,
    /// Use a connector-specific policy.
    Custom(RetryPolicy),
    /// Never retry: a single attempt, failures propagate immediately.
    Disabled,
}

/// Resolve the effective policy for one call: explicit per-call override,
/// then the connector's strategy, then the framework default. `None` means
/// retry is disabled.
pub fn resolve_policy(
    call_override: Option<RetryPolicy>,
    strategy: RetryStrategy,
) -> Option<RetryPolicy> {
    if let Some(policy) = call_override {
        return Some(policy);
    }
    match strategy {
        RetryStrategy::Default => Some(RetryPolicy::default()),
        RetryStrategy::Custom(policy) => Some(policy),
        RetryStrategy::Disabled => None,
    }
}

/// Invoke `operation`, retrying retriable failures per `policy`.
///
/// `policy = None` disables retry entirely. The backoff sleep is the only
/// blocking point in the controller.
pub async fn run_with_retry<T, P, F, Fut>(
    policy: Option<&RetryPolicy>,
    is_retriable: P,
    mut operation: F,
) -> Result<T, ConnectorError>
where
    P: Fn(&ConnectorError) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConnectorError>>,
{
    let policy = match policy {
        Some(policy) => policy,
        None => return operation().await,
    };

    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "retrieval succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) => {
                if !is_retriable(&error) {
                    debug!(attempt, error = %error, "failure is not retriable");
                    return Err(error);
                }
                if attempt >= max_attempts {
                    warn!(
                        attempts = attempt,
                        error = %error,
                        "retrieval failed, attempt budget exhausted"
                    );
                    return Err(error);
                }
                let delay = policy.backoff.delay(attempt);
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "retrieval failed, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn flaky(
        calls: &AtomicU32,
        failures: u32,
    ) -> impl FnMut() -> std::future::Ready<Result<u32, ConnectorError>> + '_ {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n <= failures {
                Err(ConnectorError::ConnectionFailed(format!("attempt {}", n)))
            } else {
                Ok(42)
            })
        }
    }

    #[tokio::test]
    async fn test_succeeds_after_two_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::with_max_attempts(5).no_backoff();
        let result = run_with_retry(Some(&policy), |_| true, flaky(&calls, 2)).await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_budget_returns_last_failure() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::with_max_attempts(2).no_backoff();
        let result = run_with_retry(Some(&policy), |_| true, flaky(&calls, 10)).await;
        match result {
            Err(ConnectorError::ConnectionFailed(msg)) => assert_eq!(msg, "attempt 2"),
            other => panic!("expected the last failure, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fatal_failure_bypasses_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::with_max_attempts(5).no_backoff();
        let result = run_with_retry(Some(&policy), |_| false, flaky(&calls, 10)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_disabled_retry_makes_one_attempt() {
        let calls = AtomicU32::new(0);
        let result = run_with_retry(None, |_| true, flaky(&calls, 10)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::with_max_attempts(1).no_backoff();
        let result = run_with_retry(Some(&policy), |_| true, flaky(&calls, 10)).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let backoff = Backoff { base_delay_ms: 100 };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_millis(800));
        assert_eq!(backoff.delay(20), Duration::from_millis(6_400));
    }

    #[test]
    fn test_policy_resolution_order() {
        let call_override = RetryPolicy::with_max_attempts(9);
        assert_eq!(
            resolve_policy(Some(call_override), RetryStrategy::Disabled),
            Some(call_override)
        );
        assert_eq!(
            resolve_policy(None, RetryStrategy::Default),
            Some(RetryPolicy::default())
        );
        let custom = RetryPolicy::with_max_attempts(7);
        assert_eq!(
            resolve_policy(None, RetryStrategy::Custom(custom)),
            Some(custom)
        );
        assert_eq!(resolve_policy(None, RetryStrategy::Disabled), None);
    }
}
