use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use crate::app::SessionConfig;
use crate::utils::InitializationError;

/// Bounded-attempt linear backoff used while (re)initializing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// First attempt plus every retry
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay after the failed attempt number `attempt` (zero based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_add(1))
    }

    /// Run `operation` until it succeeds or the budget is spent.
    /// The attempt counter starts at zero on every call.
    pub async fn run<T, E, F, Fut>(&self, mut operation: F) -> Result<T, InitializationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(attempt = attempt + 1, "Session initialized after retries");
                    }
                    return Ok(value);
                }
                Err(err) if attempt < self.max_retries => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %err,
                        "Session initialization failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    return Err(InitializationError {
                        attempts: attempt + 1,
                        reason: err.to_string(),
                    });
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::ZERO)
    }

    #[test]
    fn test_linear_backoff() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1000));
        assert_eq!(policy.delay_for(0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(3000));
        assert_eq!(policy.max_attempts(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_waits_linearly_between_attempts() {
        let attempts = parking_lot::Mutex::new(Vec::new());
        let log = &attempts;
        let start = tokio::time::Instant::now();

        let err = RetryPolicy::new(3, Duration::from_millis(1000))
            .run(|| async move {
                log.lock().push(tokio::time::Instant::now());
                Err::<(), _>("unreachable")
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 4);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(6), "elapsed {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(6050), "elapsed {:?}", elapsed);

        let attempts = attempts.lock();
        let gaps: Vec<u64> = attempts
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_millis() as u64 / 100)
            .collect();
        // 1s, 2s, 3s in tenths of a second
        assert_eq!(gaps, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_exhaustion_reports_every_attempt() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = instant_policy(3)
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("handshake refused")
            })
            .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.reason, "handshake refused");
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_recovers_midway() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = instant_policy(3)
            .run(|| async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err("not yet")
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_zero_retries_tries_once() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let err = instant_policy(0)
            .run(|| async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>("down")
            })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
