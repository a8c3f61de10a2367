//! Throttle-aware retry for remote control-plane calls.

use crate::error::DeployError;
use std::future::Future;
use std::time::Duration;

/// Fixed delay and attempt budget for throttled calls.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            delay: Duration::from_secs(3),
            max_attempts: 10,
        }
    }
}

/// Hook invoked between attempts, for observability only. Must not block.
pub type OnRetry = dyn Fn() + Send + Sync;

/// Run `op`, retrying while it fails with a throttle classification.
///
/// Only `DeployError::Throttled` is retried; any other failure propagates on
/// first occurrence. When the attempt budget runs out, the last throttling
/// failure is returned. The delay is a tokio sleep, so unrelated
/// reconciliations on other APIs keep running during the wait.
pub async fn with_retries<T, Op, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: Op,
    on_retry: Option<&OnRetry>,
) -> Result<T, DeployError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DeployError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(failure) if failure.is_throttle() && attempt < policy.max_attempts => {
                tracing::warn!(op = %operation, attempt, "rate limited, waiting before retry");
                if let Some(hook) = on_retry {
                    hook();
                }
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(failure) => return Err(failure),
        }
    }
}
