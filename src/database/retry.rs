use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tokio_retry::{strategy::FixedInterval, Retry};

/// How often and how far apart connection attempts are made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Total number of attempts, including the first one. Never less than one.
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        let retries = self.attempts() - 1;
        FixedInterval::new(self.delay).take(retries as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(5))
    }
}

/// Runs `action` until it succeeds or the policy runs out of attempts, logging every failure.
/// Returns the error of the last attempt.
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut action: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    let logged = move || {
        attempt += 1;
        let current = attempt;
        let future = action();

        async move {
            future.await.map_err(|error| {
                tracing::warn!(attempt = current, attempts, %error, "attempt failed");
                error
            })
        }
    };

    Retry::spawn(policy.strategy(), logged).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1))
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let result = retry(&quick(5), || {
            calls += 1;
            let call = calls;
            async move {
                if call < 3 {
                    Err(format!("refused #{call}"))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn gives_up_after_all_attempts() {
        let mut calls = 0;
        let result: Result<(), String> = retry(&quick(5), || {
            calls += 1;
            let call = calls;
            async move { Err(format!("refused #{call}")) }
        })
        .await;

        assert_eq!(result, Err("refused #5".to_string()));
        assert_eq!(calls, 5);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let mut calls = 0;
        let result: Result<(), &str> = retry(&quick(0), || {
            calls += 1;
            async { Err("refused") }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls, 1);
    }

    #[test]
    fn default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.delay, Duration::from_secs(5));
        assert_eq!(policy.strategy().count(), 4);
    }
}
