//! Bounded retry with exponential backoff.
//!
//! The single retry primitive for the crate. Call sites pass the operation
//! as a closure; transient-vs-fatal classification stays with the caller.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::metrics;

/// Run `op` up to `max_attempts` times, sleeping `initial_delay` after the
/// first failure and doubling the delay after each subsequent one. Returns
/// the first success or the last error.
pub async fn retry_with_backoff<T, E, F, Fut>(
    max_attempts: u32,
    initial_delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delay = initial_delay;
    let mut attempt = 1u32;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < max_attempts => {
                warn!(
                    "Attempt {}/{} failed: {}, retrying in {:?}",
                    attempt, max_attempts, e, delay
                );
                metrics::RETRY_ATTEMPTS.inc();
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_first_try() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> =
            retry_with_backoff(3, Duration::from_millis(100), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok(7) }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result: Result<&str, String> =
            retry_with_backoff(3, Duration::from_millis(100), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("unavailable".to_string())
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> =
            retry_with_backoff(3, Duration::from_millis(100), || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(format!("failure {}", n)) }
            })
            .await;

        assert_eq!(result.unwrap_err(), "failure 2");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_never_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> =
            retry_with_backoff(1, Duration::from_millis(100), || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err("nope".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
