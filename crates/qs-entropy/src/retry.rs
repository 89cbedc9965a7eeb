//! Bounded retry with exponential backoff

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::EntropyResult;

/// How often and how patiently to retry transient failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay before the second attempt
    pub initial_backoff_ms: u64,
    /// Growth factor between attempts
    pub multiplier: f64,
    /// Upper bound on a single delay
    pub max_backoff_ms: u64,
}

impl RetryPolicy {
    /// Fail on the first error
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the given failed attempt (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.saturating_sub(1) as i32);
        let ms = (self.initial_backoff_ms as f64 * factor).min(self.max_backoff_ms as f64);
        Duration::from_millis(ms as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 200,
            multiplier: 2.0,
            max_backoff_ms: 5_000,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or attempts run out
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, label: &str, mut op: F) -> EntropyResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = EntropyResult<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "[Retry] {} attempt {}/{} failed: {}; retrying in {:?}",
                    label,
                    attempt,
                    max_attempts,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
