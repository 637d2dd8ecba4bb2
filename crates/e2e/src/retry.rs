//! Bounded retries for lookups that can lose a race with rendering

use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::config::RetryConfig;
use crate::error::E2eResult;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: usize, delay: Duration) -> Self {
        Self { attempts, delay }
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self::new(config.attempts, Duration::from_millis(config.delay_ms))
    }
}

/// Outcome of a search that ran out of attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retried<T> {
    Found { value: T, attempt: usize },
    Exhausted { attempts: usize },
}

/// Run `op` until it yields `Some`, at most `policy.attempts` times.
///
/// `Ok(None)` from `op` is a miss and is retried; `Err` aborts immediately.
/// Attempt numbers passed to `op` start at 1.
pub async fn retry_until_found<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut op: F,
) -> E2eResult<Retried<T>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = E2eResult<Option<T>>>,
{
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        if let Some(value) = op(attempt).await? {
            return Ok(Retried::Found { value, attempt });
        }

        debug!("{} missing on attempt {}/{}", what, attempt, attempts);

        if attempt < attempts && !policy.delay.is_zero() {
            tokio::time::sleep(policy.delay).await;
        }
    }

    Ok(Retried::Exhausted { attempts })
}
