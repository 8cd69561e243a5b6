//! The retry loop and its convenience entry points.

use super::strategy::Backoff;
use super::waiter::{JitteredBackoff, PerishableWaiter};
use crate::error::{ClassifiedError, RetryError};
use crate::observe::{NoopObserver, RetryObserver, notify};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Result of a retry session.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Run `operation` until it succeeds, fails permanently, or `waiter` reports
/// that the deadline has passed.
///
/// The waiter is armed once at the start of the session. A non-retriable
/// failure ends the session immediately with that failure's cause. When the
/// deadline passes, the cause of the last retriable failure is returned.
///
/// # Examples
///
/// ```rust
/// use svctools_core::error::ClassifiedError;
/// use svctools_core::retry::{Backoff, JitteredBackoff, retry};
/// use std::time::Duration;
///
/// # async fn example() {
/// let mut waiter = JitteredBackoff::new(
///     Duration::from_secs(5),
///     Duration::from_millis(10),
///     Duration::ZERO,
///     Backoff::Exponential,
/// );
///
/// let mut calls = 0;
/// let result = retry(
///     || {
///         calls += 1;
///         let outcome = if calls < 3 {
///             Err(ClassifiedError::retriable(std::io::Error::other("busy")))
///         } else {
///             Ok("done")
///         };
///         async move { outcome }
///     },
///     &mut waiter,
/// )
/// .await;
///
/// assert_eq!(result.unwrap(), "done");
/// # }
/// ```
pub async fn retry<F, Fut, T, E, W>(operation: F, waiter: &mut W) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
    W: PerishableWaiter,
{
    retry_observed(operation, waiter, &NoopObserver).await
}

/// [`retry`], reporting progress to `observer`.
///
/// Observer calls are best-effort and never change the outcome.
pub async fn retry_observed<F, Fut, T, E, W, O>(
    mut operation: F,
    waiter: &mut W,
    observer: &O,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
    W: PerishableWaiter,
    O: RetryObserver + ?Sized,
{
    let session = Instant::now();
    waiter.start();

    let mut attempt: u32 = 0;
    let outcome = loop {
        attempt = attempt.saturating_add(1);
        notify("attempt_started", || observer.attempt_started());

        let started = Instant::now();
        let result = operation().await;
        let elapsed = started.elapsed();
        notify("attempt_finished", || observer.attempt_finished(elapsed));
        debug!(
            attempt,
            elapsed_ms = elapsed.as_millis() as u64,
            succeeded = result.is_ok(),
            "Retry attempt finished"
        );

        let err = match result {
            Ok(value) => break Ok(value),
            Err(err) => err,
        };

        if !err.is_retriable() {
            notify("non_retriable", || observer.non_retriable());
            debug!(attempt, "Non-retriable failure; giving up");
            break Err(RetryError::NonRetriable {
                cause: err.into_cause(),
            });
        }

        if let Err(err) = waiter.wait_or_die(err).await {
            notify("exhausted", || observer.exhausted());
            warn!(
                attempt,
                elapsed_ms = session.elapsed().as_millis() as u64,
                "Retry deadline reached"
            );
            break Err(RetryError::Exhausted {
                cause: err.into_cause(),
            });
        }
    };

    notify("session_finished", || {
        observer.session_finished(session.elapsed())
    });
    outcome
}

/// [`retry`] for operations that accept a cancellation token.
///
/// Each attempt receives a clone of `token`. The loop itself only stops on
/// its own deadline; propagating cancellation is up to the operation, for
/// example by returning a non-retriable error once the token is cancelled.
pub async fn retry_cancellable<F, Fut, T, E, W>(
    mut operation: F,
    waiter: &mut W,
    token: &CancellationToken,
) -> RetryResult<T, E>
where
    F: FnMut(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
    W: PerishableWaiter,
{
    retry(|| operation(token.clone()), waiter).await
}

/// Retry with a fresh [`JitteredBackoff`] using the given backoff family.
pub async fn retry_with_backoff<F, Fut, T, E>(
    backoff: Backoff,
    operation: F,
    timeout: Duration,
    interval: Duration,
    max_jitter: Duration,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    let mut waiter = JitteredBackoff::new(timeout, interval, max_jitter, backoff);
    retry(operation, &mut waiter).await
}

/// Retry with only jitter between attempts.
pub async fn retry_immediate<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    max_jitter: Duration,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with_backoff(Backoff::None, operation, timeout, Duration::ZERO, max_jitter).await
}

/// Retry every `interval` (plus jitter).
pub async fn retry_periodic<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    interval: Duration,
    max_jitter: Duration,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with_backoff(Backoff::Constant, operation, timeout, interval, max_jitter).await
}

/// Retry with waits of `interval`, `2 * interval`, `3 * interval`, ...
pub async fn retry_linear<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    interval: Duration,
    max_jitter: Duration,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with_backoff(Backoff::Linear, operation, timeout, interval, max_jitter).await
}

/// Retry with waits that double from `initial`.
pub async fn retry_exponential<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    initial: Duration,
    max_jitter: Duration,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with_backoff(Backoff::Exponential, operation, timeout, initial, max_jitter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::Jitter;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn waiter(ttl: Duration, initial: Duration, backoff: Backoff) -> JitteredBackoff {
        JitteredBackoff::builder()
            .ttl(ttl)
            .initial(initial)
            .backoff(backoff)
            .jitter(Jitter::None)
            .build()
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_third_attempt() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut w = waiter(Duration::from_secs(10), Duration::from_millis(10), Backoff::Linear);

        let result = retry(
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ClassifiedError::retriable("flaky"))
                    } else {
                        Ok(42)
                    }
                }
            },
            &mut w,
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert_eq!(w.round(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retriable_short_circuits() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut w = waiter(Duration::from_secs(10), Duration::from_secs(1), Backoff::Constant);
        let before = Instant::now();

        let result: RetryResult<(), _> = retry(
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err(ClassifiedError::non_retriable("bad request"))
                }
            },
            &mut w,
        )
        .await;

        assert_eq!(
            result,
            Err(RetryError::NonRetriable {
                cause: Some("bad request")
            })
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(w.round(), 0);
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_cause() {
        let attempts = Arc::new(AtomicU32::new(0));
        let mut w = waiter(
            Duration::from_millis(100),
            Duration::from_millis(30),
            Backoff::Constant,
        );

        let result: RetryResult<(), String> = retry(
            || {
                let attempts = Arc::clone(&attempts);
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    Err(ClassifiedError::retriable(format!("attempt {}", n)))
                }
            },
            &mut w,
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.is_exhausted());
        // waits end at 30, 60, 90; the fourth wait hits the deadline
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(err.into_cause(), Some("attempt 3".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cause_less_retriable_failure() {
        let mut w = waiter(Duration::ZERO, Duration::from_millis(1), Backoff::Constant);
        let result: RetryResult<(), &str> =
            retry(|| async { Err(ClassifiedError::transient()) }, &mut w).await;
        assert_eq!(result, Err(RetryError::Exhausted { cause: None }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellable_operation_receives_token() {
        let token = CancellationToken::new();
        token.cancel();
        let mut w = waiter(Duration::from_secs(1), Duration::from_millis(10), Backoff::Constant);

        let result: RetryResult<(), _> = retry_cancellable(
            |token| async move {
                if token.is_cancelled() {
                    Err(ClassifiedError::non_retriable("cancelled"))
                } else {
                    Err(ClassifiedError::retriable("busy"))
                }
            },
            &mut w,
            &token,
        )
        .await;

        assert_eq!(result.unwrap_err().into_cause(), Some("cancelled"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_convenience_entry_points_succeed() {
        let timeout = Duration::from_secs(5);
        let interval = Duration::from_millis(20);
        let jitter = Duration::from_millis(5);

        let ok = retry_immediate(|| async { Ok::<_, ClassifiedError<()>>(1) }, timeout, jitter);
        assert_eq!(ok.await, Ok(1));

        let ok = retry_periodic(|| async { Ok::<_, ClassifiedError<()>>(2) }, timeout, interval, jitter);
        assert_eq!(ok.await, Ok(2));

        let ok = retry_linear(|| async { Ok::<_, ClassifiedError<()>>(3) }, timeout, interval, jitter);
        assert_eq!(ok.await, Ok(3));

        let ok =
            retry_exponential(|| async { Ok::<_, ClassifiedError<()>>(4) }, timeout, interval, jitter);
        assert_eq!(ok.await, Ok(4));
    }
}
