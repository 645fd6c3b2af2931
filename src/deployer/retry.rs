// ABOUTME: Optimistic-concurrency retry helper with a bounded backoff schedule.
// ABOUTME: Re-runs a whole fetch-mutate-submit attempt while it fails with a conflict.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Backoff schedule for conflict retries.
///
/// The default mirrors the Kubernetes client's default conflict retry:
/// five attempts, 10ms apart, with 10% jitter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub steps: u32,
    /// Delay before the second attempt.
    pub duration: Duration,
    /// Multiplier applied to the delay after each attempt.
    pub factor: f64,
    /// Upper bound of random extra delay, as a fraction of the delay.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            steps: 5,
            duration: Duration::from_millis(10),
            factor: 1.0,
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Policy that never waits between attempts.
    pub fn immediate(steps: u32) -> Self {
        Self {
            steps,
            duration: Duration::ZERO,
            factor: 1.0,
            jitter: 0.0,
        }
    }

    /// Delay to wait after the given zero-based attempt, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = self.factor.max(1.0).powi(attempt as i32);
        self.duration.mul_f64(factor)
    }

    fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        if self.jitter > 0.0 && !base.is_zero() {
            let extra = rand::thread_rng().gen_range(0.0..self.jitter);
            base + base.mul_f64(extra)
        } else {
            base
        }
    }
}

/// Run `attempt` until it succeeds, fails with a non-conflict error, or the
/// policy's attempt budget is spent.
///
/// Each call to `attempt` must perform a complete fetch-mutate-submit cycle so
/// that a retry works against fresh state. When the budget runs out the last
/// conflict error is returned.
pub async fn retry_on_conflict<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_conflict: P,
    mut attempt: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let steps = policy.steps.max(1);
    let mut n = 0;

    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) if is_conflict(&e) && n + 1 < steps => {
                let delay = policy.delay(n);
                tracing::debug!(attempt = n + 1, ?delay, "conflict on submit, retrying");
                tokio::time::sleep(delay).await;
                n += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
