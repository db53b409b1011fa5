use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Explicit retry parameters for a provider request.
/// `max_attempts == 1` means a single try with no retries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Linear backoff: nothing before the first attempt, `backoff * n` before attempt n.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }

    /// Run `op` until it succeeds or attempts run out; returns the last error.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_err = None;
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.delay_for(attempt)).await;
            }
            match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt + 1 < self.max_attempts {
                        tracing::debug!(label, attempt, error = %e, "request failed, retrying");
                    }
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("{}: no attempts made", label)))
    }
}
