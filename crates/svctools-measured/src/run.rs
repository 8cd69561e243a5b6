//! Retry entry points that report to [`Collectors`].

use crate::collectors::Collectors;
use std::future::Future;
use std::time::Duration;
use svctools_core::error::ClassifiedError;
use svctools_core::retry::{self, Backoff, JitteredBackoff, PerishableWaiter, RetryResult};

/// Run a retry session with `waiter`, reporting to `collectors`.
pub async fn retry<F, Fut, T, E, W>(
    operation: F,
    waiter: &mut W,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
    W: PerishableWaiter,
{
    retry::retry_observed(operation, waiter, collectors).await
}

async fn retry_with<F, Fut, T, E>(
    backoff: Backoff,
    operation: F,
    timeout: Duration,
    base: Duration,
    max_jitter: Duration,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    let mut waiter = JitteredBackoff::new(timeout, base, max_jitter, backoff);
    retry(operation, &mut waiter, collectors).await
}

/// Measured [`retry_immediate`](svctools_core::retry::retry_immediate).
pub async fn retry_immediate<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    max_jitter: Duration,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with(
        Backoff::None,
        operation,
        timeout,
        Duration::ZERO,
        max_jitter,
        collectors,
    )
    .await
}

/// Measured [`retry_periodic`](svctools_core::retry::retry_periodic).
pub async fn retry_periodic<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    base: Duration,
    max_jitter: Duration,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with(Backoff::Constant, operation, timeout, base, max_jitter, collectors).await
}

/// Measured [`retry_linear`](svctools_core::retry::retry_linear).
pub async fn retry_linear<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    base: Duration,
    max_jitter: Duration,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with(Backoff::Linear, operation, timeout, base, max_jitter, collectors).await
}

/// Measured [`retry_exponential`](svctools_core::retry::retry_exponential).
pub async fn retry_exponential<F, Fut, T, E>(
    operation: F,
    timeout: Duration,
    base: Duration,
    max_jitter: Duration,
    collectors: &Collectors,
) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClassifiedError<E>>>,
    E: Send,
{
    retry_with(
        Backoff::Exponential,
        operation,
        timeout,
        base,
        max_jitter,
        collectors,
    )
    .await
}
