//! Retry policy shared by the extractor and the publisher.
//!
//! Both stages retry transient failures with linearly increasing backoff:
//! attempt N sleeps N × base before running (2s, 4s, ... with the default
//! base). Validation-class and postcondition errors are never retried.

use std::future::Future;
use std::time::Duration;

use tokio_retry::RetryIf;

/// Linear backoff strategy: base, 2×base, 3×base, ...
///
/// Shaped like the strategies in `tokio_retry::strategy` so it plugs into
/// [`tokio_retry::RetryIf`] directly.
#[derive(Debug, Clone)]
pub struct LinearBackoff {
    base: Duration,
    attempt: u32,
}

impl LinearBackoff {
    pub fn new(base: Duration) -> Self {
        Self { base, attempt: 0 }
    }

    pub fn from_millis(base: u64) -> Self {
        Self::new(Duration::from_millis(base))
    }
}

impl Iterator for LinearBackoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        self.attempt += 1;
        Some(self.base * self.attempt)
    }
}

/// Runs `action` up to `attempts` times, sleeping linearly between attempts,
/// retrying only while `is_transient` holds for the error.
///
/// The final error is returned unchanged, so callers see exactly what the
/// last attempt saw.
pub async fn retry_transient<T, E, A, F>(
    attempts: usize,
    base: Duration,
    action: A,
    is_transient: fn(&E) -> bool,
) -> Result<T, E>
where
    A: FnMut() -> F,
    F: Future<Output = Result<T, E>>,
{
    let strategy = LinearBackoff::new(base).take(attempts.saturating_sub(1));
    RetryIf::spawn(strategy, action, is_transient).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_linear_backoff_grows_by_attempt() {
        let delays: Vec<Duration> = LinearBackoff::from_millis(2000).take(3).collect();
        assert_eq!(
            delays,
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(6)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhausts_after_configured_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), &str> = retry_transient(
            3,
            Duration::from_secs(2),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("boom") }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_recovers_mid_budget() {
        let calls = AtomicUsize::new(0);
        let result: Result<u32, &str> = retry_transient(
            3,
            Duration::from_secs(2),
            || {
                let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if attempt < 3 {
                        Err("transient")
                    } else {
                        Ok(42)
                    }
                }
            },
            |_| true,
        )
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_stops_on_permanent_error() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), &str> = retry_transient(
            3,
            Duration::from_secs(2),
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("permanent") }
            },
            |e| *e != "permanent",
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
