use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Retries transport-level failures (connect errors, timeouts) of an HTTP call.
///
/// Responses with an error status are not retried here; callers decide what a
/// non-success status means for their resource.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            retries: 2,
            delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        RetryPolicy {
            retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub async fn run<F, Fut, T>(&self, mut operation: F) -> Result<T, reqwest::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, reqwest::Error>>,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(val) => return Ok(val),
                Err(err) => {
                    if attempt > self.retries || !is_transient(&err) {
                        return Err(err);
                    }
                    debug!(
                        "Attempt {}/{} failed: {}. Retrying...",
                        attempt,
                        self.retries + 1,
                        err
                    );
                    attempt += 1;
                    sleep(self.delay).await;
                }
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_connect_errors_are_retried() {
        let policy = RetryPolicy {
            retries: 2,
            delay: Duration::from_millis(1),
        };
        let attempts = AtomicUsize::new(0);

        // Port 9 (discard) is closed on test machines, so every attempt fails to connect.
        let result = policy
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                reqwest::get("http://127.0.0.1:9/")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_no_retry_policy_runs_once() {
        let attempts = AtomicUsize::new(0);

        let result = RetryPolicy::none()
            .run(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                reqwest::get("http://127.0.0.1:9/")
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
