//! Integration tests for measured retry sessions

use rstest::rstest;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use svctools_core::error::ClassifiedError;
use svctools_core::retry::{Backoff, Jitter, JitteredBackoff};
use svctools_measured::{
    Collectors, InMemoryCollectors, Meter, retry, retry_exponential, retry_linear, retry_periodic,
};

type Outcome = Result<u32, ClassifiedError<&'static str>>;

fn failing_then_ok(
    failures: u32,
    calls: Arc<AtomicU32>,
) -> impl FnMut() -> std::future::Ready<Outcome> {
    move || {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        std::future::ready(if n < failures {
            Err(ClassifiedError::retriable("unavailable"))
        } else {
            Ok(n)
        })
    }
}

#[rstest]
#[case::periodic(Backoff::Constant)]
#[case::linear(Backoff::Linear)]
#[case::exponential(Backoff::Exponential)]
#[tokio::test(start_paused = true)]
async fn test_three_attempts_are_metered(#[case] backoff: Backoff) {
    let metrics = InMemoryCollectors::new();
    let calls = Arc::new(AtomicU32::new(0));
    let operation = failing_then_ok(2, Arc::clone(&calls));
    let timeout = Duration::from_secs(30);
    let base = Duration::from_millis(25);
    let jitter = Duration::from_millis(5);
    let collectors = metrics.collectors();

    let result = match backoff {
        Backoff::Constant => retry_periodic(operation, timeout, base, jitter, &collectors).await,
        Backoff::Linear => retry_linear(operation, timeout, base, jitter, &collectors).await,
        _ => retry_exponential(operation, timeout, base, jitter, &collectors).await,
    };

    assert_eq!(result, Ok(2));
    assert_eq!(metrics.attempt.count(), 3);
    assert_eq!(metrics.error.count(), 0);
    assert_eq!(metrics.fatal.count(), 0);
    assert_eq!(metrics.attempt_time.samples(), 3);
    assert_eq!(metrics.total_time.samples(), 1);
    assert!(metrics.total_time.total() >= Duration::from_millis(50));
}

#[tokio::test(start_paused = true)]
async fn test_non_retriable_marks_error_meter() {
    let metrics = InMemoryCollectors::new();

    let result = retry_periodic(
        || async { Err::<u32, _>(ClassifiedError::non_retriable("rejected")) },
        Duration::from_secs(30),
        Duration::from_millis(25),
        Duration::ZERO,
        &metrics.collectors(),
    )
    .await;

    assert_eq!(result.unwrap_err().into_cause(), Some("rejected"));
    assert_eq!(metrics.attempt.count(), 1);
    assert_eq!(metrics.error.count(), 1);
    assert_eq!(metrics.fatal.count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_marks_fatal_meter() {
    let metrics = InMemoryCollectors::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut waiter = JitteredBackoff::builder()
        .ttl(Duration::from_millis(100))
        .initial(Duration::from_millis(40))
        .backoff(Backoff::Constant)
        .jitter(Jitter::None)
        .build();

    let result = retry(
        failing_then_ok(u32::MAX, Arc::clone(&calls)),
        &mut waiter,
        &metrics.collectors(),
    )
    .await;

    let err = result.unwrap_err();
    assert!(err.is_exhausted());
    // attempts at 0, 40, 80; the next wait would end at 120
    assert_eq!(metrics.attempt.count(), 3);
    assert_eq!(metrics.fatal.count(), 1);
    assert_eq!(metrics.error.count(), 0);
    assert_eq!(metrics.total_time.samples(), 1);
}

struct BrokenMeter;

impl Meter for BrokenMeter {
    fn mark(&self, _n: i64) {
        panic!("statsd socket closed");
    }
}

#[tokio::test(start_paused = true)]
async fn test_broken_sink_does_not_change_outcome() {
    let calls = Arc::new(AtomicU32::new(0));
    let collectors = Collectors {
        attempt: Arc::new(BrokenMeter),
        ..Default::default()
    };

    let result = retry_linear(
        failing_then_ok(1, Arc::clone(&calls)),
        Duration::from_secs(5),
        Duration::from_millis(10),
        Duration::ZERO,
        &collectors,
    )
    .await;

    assert_eq!(result, Ok(1));
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
