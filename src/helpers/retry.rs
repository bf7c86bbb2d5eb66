use std::future::Future;
use std::time::Duration;
use tracing::warn;
use crate::error::Result;

pub const RETRY_LIMIT: usize = 3;
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Bounded exponential backoff for calls that failed on the wire or with a 5xx.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub limit: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            limit: RETRY_LIMIT,
            base_delay: RETRY_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn new(limit: usize, base_delay: Duration) -> Self {
        Self { limit, base_delay }
    }

    /// Single attempt, used where the caller already degrades on failure.
    pub fn no_retry() -> Self {
        Self {
            limit: 1,
            base_delay: Duration::ZERO,
        }
    }

    pub fn delay_for(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16) as u32;
        self.base_delay.saturating_mul(factor).min(MAX_RETRY_DELAY)
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.limit.max(1);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt + 1 < attempts => {
                    let delay = self.delay_for(attempt);
                    warn!("{} failed due to: {}, retrying in {:?}", what, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use reqwest::StatusCode;
    use super::*;
    use crate::error::ClientError;

    #[test]
    fn delay_doubles_and_is_capped() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100));
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(12), MAX_RETRY_DELAY);
    }

    #[tokio::test]
    async fn retries_server_errors_up_to_the_limit() {
        let calls = &AtomicUsize::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let res: Result<()> = policy
            .run("flaky call", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::Api {
                    status: StatusCode::SERVICE_UNAVAILABLE,
                    message: "down".into(),
                })
            })
            .await;
        assert!(res.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let calls = &AtomicUsize::new(0);
        let res: Result<()> = RetryPolicy::default()
            .run("bad request", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ClientError::validation("missing field"))
            })
            .await;
        assert!(matches!(res, Err(ClientError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = &AtomicUsize::new(0);
        let res = RetryPolicy::new(5, Duration::from_millis(1))
            .run("eventually ok", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ClientError::Api {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        message: "boom".into(),
                    })
                } else {
                    Ok(n)
                }
            })
            .await;
        assert_eq!(res.unwrap(), 2);
    }
}
