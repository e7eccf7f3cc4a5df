//! Attempt policy for outbound remote calls.
//!
//! Every remote call site (image fetch, batch transform, artifact upload,
//! notification) runs through a [`RetryPolicy`]. The service currently
//! ships with [`RetryPolicy::NO_RETRY`]: one failed attempt is terminal
//! for the request.

use std::future::Future;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
}

impl RetryPolicy {
    /// A single attempt, no retries.
    pub const NO_RETRY: Self = Self { max_attempts: 1 };

    /// Policy allowing up to `max_attempts` tries (at least one).
    pub const fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
        }
    }

    pub fn max_attempts(self) -> u32 {
        self.max_attempts
    }

    /// Run `call` until it succeeds or the attempt budget is spent.
    ///
    /// Returns the error of the last attempt.
    pub async fn run<T, E, F, Fut>(self, operation: &str, mut call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts => {
                    tracing::warn!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Remote call failed, retrying"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NO_RETRY
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[test]
    fn zero_attempts_is_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::default(), RetryPolicy::NO_RETRY);
    }

    #[tokio::test]
    async fn no_retry_calls_exactly_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = RetryPolicy::NO_RETRY
            .run("test", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;

        assert_eq!(result.unwrap_err(), "down");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = RetryPolicy::new(3)
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 2 {
                    Err(format!("attempt {n} failed"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn returns_last_error_when_budget_spent() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = RetryPolicy::new(3)
            .run("test", || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                Err(format!("attempt {n} failed"))
            })
            .await;

        assert_eq!(result.unwrap_err(), "attempt 3 failed");
    }
}
