//! Retry logic with exponential backoff for network operations.

use crate::config::RetryConfig;
use crate::error::{CliError, ReleaseError, Result};
use std::future::Future;
use tokio::time::{Duration, Instant};

/// Maximum single backoff (1 hour)
const MAX_BACKOFF: Duration = Duration::from_secs(3600);

/// How often and how long to retry one operation
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = try once)
    pub max_retries: u32,
    /// Wait before the first retry; doubles afterwards
    pub base_delay: Duration,
    /// Absolute limit for all attempts together
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            deadline: Duration::from_secs(1800),
        }
    }
}

impl RetryPolicy {
    /// Policy for GitHub API calls
    pub fn github_api(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.github_api,
            deadline: Duration::from_secs(config.deadline_secs),
            ..Self::default()
        }
    }

    /// Policy for asset uploads
    pub fn uploads(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.uploads,
            deadline: Duration::from_secs(config.deadline_secs),
            ..Self::default()
        }
    }

    /// Backoff before retry number `attempt` (1-based): base, 2*base, 4*base...
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Retry an async operation with exponential backoff.
///
/// Only errors reporting [`ReleaseError::is_recoverable`] are retried; all
/// others are returned at once.
pub async fn retry_with_backoff<F, T, Fut>(
    mut operation: F,
    policy: &RetryPolicy,
    operation_name: &str,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let start_time = Instant::now();
    let deadline = start_time + policy.deadline;
    let mut attempts = 0u32;

    loop {
        match operation().await {
            Ok(result) => {
                if attempts > 0 {
                    log::info!("{} succeeded after {} retry(ies)", operation_name, attempts);
                }
                return Ok(result);
            }
            Err(e) => {
                if !e.is_recoverable() {
                    return Err(e);
                }

                if attempts >= policy.max_retries {
                    log::error!("{} failed after {} attempt(s)", operation_name, attempts + 1);
                    return Err(e);
                }

                attempts += 1;

                let remaining = deadline.saturating_duration_since(Instant::now());
                let wait = policy.backoff(attempts).min(remaining);
                if remaining.is_zero() {
                    return Err(ReleaseError::Cli(CliError::ExecutionFailed {
                        command: operation_name.to_string(),
                        reason: format!(
                            "Operation timed out after {} attempts over {:.1}s: {}",
                            attempts,
                            start_time.elapsed().as_secs_f64(),
                            e
                        ),
                    }));
                }

                log::warn!(
                    "{} failed (attempt {}/{}): {}. Retrying in {:.1}s",
                    operation_name,
                    attempts,
                    policy.max_retries + 1,
                    e,
                    wait.as_secs_f64()
                );

                tokio::time::sleep(wait).await;
            }
        }
    }
}
