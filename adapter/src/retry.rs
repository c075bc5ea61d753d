//! Retry policy for demo rendering during the build tool's cold-start
//! window.
//!
//! The build tool may not be listening yet when the first render is
//! requested, so failures are retried with a fixed spacing — but only until
//! the first render of the adapter's lifetime succeeds. A first success
//! proves the service reachable; failures after that point likely mean the
//! pattern genuinely does not exist or the page genuinely errors, and
//! retrying would only mask them.

use std::future::Future;
use std::time::Duration;

/// Explicit retry state, threaded through [`run_with_retry`] so the policy
/// is testable on its own.
#[derive(Debug)]
pub(crate) struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
    succeeded_once: bool,
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self {
            max_attempts: 10,
            delay: Duration::from_secs(1),
            succeeded_once: false,
        }
    }

    fn should_retry(&self, attempts_made: u32) -> bool {
        !self.succeeded_once && attempts_made < self.max_attempts
    }
}

/// Run `attempt` under `policy`.
///
/// On success the policy is marked; every later run propagates failures
/// immediately. On failure, retries are spaced by the policy's delay and
/// capped at its attempt budget — a budget of 10 means the tenth failure
/// propagates and an eleventh attempt is never made.
pub(crate) async fn run_with_retry<F, Fut, T, E>(
    policy: &mut RetryPolicy,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempts_made = 0u32;
    loop {
        attempts_made += 1;
        match attempt().await {
            Ok(value) => {
                policy.succeeded_once = true;
                return Ok(value);
            }
            Err(error) => {
                if !policy.should_retry(attempts_made) {
                    return Err(error);
                }
                tracing::debug!(attempts_made, "render failed during cold start, retrying");
                tokio::time::sleep(policy.delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    /// Attempt that fails `failures` times, then succeeds forever.
    fn flaky(calls: &Cell<u32>, failures: u32) -> impl FnMut() -> std::future::Ready<Result<u32, &'static str>> {
        move || {
            let call = calls.get() + 1;
            calls.set(call);
            std::future::ready(if call <= failures { Err("refused") } else { Ok(call) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_failures_then_success() {
        let calls = Cell::new(0);
        let mut policy = RetryPolicy::new();
        let started = Instant::now();

        let result = run_with_retry(&mut policy, flaky(&calls, 3)).await;

        assert_eq!(result, Ok(4));
        assert_eq!(calls.get(), 4);
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistent_failure_stops_after_ten_attempts() {
        let calls = Cell::new(0);
        let mut policy = RetryPolicy::new();

        let result = run_with_retry(&mut policy, flaky(&calls, u32::MAX)).await;

        assert_eq!(result, Err("refused"));
        assert_eq!(calls.get(), 10, "the eleventh attempt must not be made");
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_after_first_success_propagates_immediately() {
        let calls = Cell::new(0);
        let mut policy = RetryPolicy::new();

        run_with_retry(&mut policy, flaky(&calls, 0)).await.unwrap();
        assert_eq!(calls.get(), 1);

        let started = Instant::now();
        let failures = Cell::new(0);
        let result = run_with_retry(&mut policy, || {
            failures.set(failures.get() + 1);
            std::future::ready(Err::<u32, _>("gone"))
        })
        .await;

        assert_eq!(result, Err("gone"));
        assert_eq!(failures.get(), 1, "no retries once a render has succeeded");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt_takes_no_delay() {
        let calls = Cell::new(0);
        let mut policy = RetryPolicy::new();
        let started = Instant::now();

        run_with_retry(&mut policy, flaky(&calls, 0)).await.unwrap();

        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
