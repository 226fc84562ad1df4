//! Bounded-attempt retry with a fixed backoff

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// How many times an operation may run and how long to wait between runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Run `op` until it succeeds, `should_retry` rejects the error, or the
/// attempt budget is spent. `op` receives the 1-based attempt number.
/// Returns the last error when giving up.
pub async fn attempt<T, E, F, Fut, R>(
    policy: RetryPolicy,
    label: &str,
    should_retry: R,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    E: Display,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt_no = 1;
    loop {
        match op(attempt_no).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!("Attempt {}/{} for {} failed: {}", attempt_no, max_attempts, label, e);
                let remaining = max_attempts - attempt_no;
                if remaining == 0 || !should_retry(&e) {
                    return Err(e);
                }
                info!(
                    "Retrying {} in {:?}... ({} attempts left)",
                    label, policy.backoff, remaining
                );
                tokio::time::sleep(policy.backoff).await;
                attempt_no += 1;
            }
        }
    }
}
