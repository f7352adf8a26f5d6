//! Retry with linear backoff
//!
//! Only network failures are retried; anything the server answered is final.

use std::future::Future;
use std::time::Duration;

use super::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// The n-th retry waits `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }
}

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// the policy runs out of retries
pub async fn with_retry<F, Fut, T>(
    operation_name: &str,
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    let mut retry = 0;

    loop {
        match operation().await {
            Ok(result) => {
                if retry > 0 {
                    tracing::debug!(operation = operation_name, retry, "Request succeeded after retry");
                }
                return Ok(result);
            }
            Err(err) if err.is_retryable() && retry < policy.max_retries => {
                retry += 1;
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    operation = operation_name,
                    retry,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if err.is_retryable() {
                    tracing::error!(
                        operation = operation_name,
                        attempts = retry + 1,
                        error = %err,
                        "Request failed, giving up"
                    );
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_backoff_is_linear() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
        };
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(500));
        assert_eq!(policy.delay_for(3), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn test_network_errors_are_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_retry("test", &fast_policy(3), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ClientError::new(ErrorKind::Network))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry("test", &fast_policy(2), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::new(ErrorKind::Network))
        })
        .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Network);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_server_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = with_retry("test", &fast_policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::new(ErrorKind::Server))
        })
        .await;

        assert_eq!(result.unwrap_err().kind, ErrorKind::Server);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
