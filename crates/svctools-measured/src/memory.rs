//! In-memory sinks backed by atomics.

use crate::collectors::{Collectors, Meter, Timer};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::Duration;

/// Meter that keeps a running total.
#[derive(Debug, Default)]
pub struct AtomicMeter {
    count: AtomicI64,
}

impl AtomicMeter {
    /// Sum of everything marked so far.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Meter for AtomicMeter {
    fn mark(&self, n: i64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }
}

/// Timer that keeps a sample count and a saturating total.
#[derive(Debug, Default)]
pub struct AtomicTimer {
    samples: AtomicU64,
    total_nanos: AtomicU64,
}

impl AtomicTimer {
    /// Number of samples recorded.
    pub fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    /// Sum of all samples.
    pub fn total(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }
}

impl Timer for AtomicTimer {
    fn update(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.samples.fetch_add(1, Ordering::Relaxed);
        let _ = self
            .total_nanos
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(nanos))
            });
    }
}

/// A full set of atomic sinks, readable after a session.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCollectors {
    /// Attempts started.
    pub attempt: Arc<AtomicMeter>,
    /// Non-retriable failures.
    pub error: Arc<AtomicMeter>,
    /// Exhausted sessions.
    pub fatal: Arc<AtomicMeter>,
    /// Session durations.
    pub total_time: Arc<AtomicTimer>,
    /// Attempt durations.
    pub attempt_time: Arc<AtomicTimer>,
}

impl InMemoryCollectors {
    /// Fresh, zeroed sinks.
    pub fn new() -> Self {
        Self::default()
    }

    /// [`Collectors`] writing into these sinks.
    pub fn collectors(&self) -> Collectors {
        Collectors {
            attempt: self.attempt.clone(),
            error: self.error.clone(),
            fatal: self.fatal.clone(),
            total_time: self.total_time.clone(),
            attempt_time: self.attempt_time.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meter_accumulates() {
        let meter = AtomicMeter::default();
        meter.mark(1);
        meter.mark(4);
        assert_eq!(meter.count(), 5);
    }

    #[test]
    fn test_timer_saturates() {
        let timer = AtomicTimer::default();
        timer.update(Duration::MAX);
        timer.update(Duration::from_secs(1));
        assert_eq!(timer.samples(), 2);
        assert_eq!(timer.total(), Duration::from_nanos(u64::MAX));
    }
}
