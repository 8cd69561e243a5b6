//! Sink traits and the collector bundle.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use svctools_core::observe::RetryObserver;

/// Rate-style sink; marks occurrences of an event.
pub trait Meter: Send + Sync {
    /// Record `n` occurrences.
    fn mark(&self, n: i64);
}

/// Latency sink.
pub trait Timer: Send + Sync {
    /// Record one duration sample.
    fn update(&self, elapsed: Duration);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl Meter for NoopSink {
    fn mark(&self, _n: i64) {}
}

impl Timer for NoopSink {
    fn update(&self, _elapsed: Duration) {}
}

/// The sinks a retry session reports to.
///
/// Unset sinks default to [`NoopSink`].
#[derive(Clone)]
pub struct Collectors {
    /// Marked once per attempt.
    pub attempt: Arc<dyn Meter>,
    /// Marked when a non-retriable error ends the session.
    pub error: Arc<dyn Meter>,
    /// Marked when the session runs out of time.
    pub fatal: Arc<dyn Meter>,
    /// Duration of the whole session.
    pub total_time: Arc<dyn Timer>,
    /// Duration of each attempt.
    pub attempt_time: Arc<dyn Timer>,
}

impl Default for Collectors {
    fn default() -> Self {
        Self {
            attempt: Arc::new(NoopSink),
            error: Arc::new(NoopSink),
            fatal: Arc::new(NoopSink),
            total_time: Arc::new(NoopSink),
            attempt_time: Arc::new(NoopSink),
        }
    }
}

impl fmt::Debug for Collectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collectors").finish_non_exhaustive()
    }
}

impl RetryObserver for Collectors {
    fn attempt_started(&self) {
        self.attempt.mark(1);
    }

    fn attempt_finished(&self, elapsed: Duration) {
        self.attempt_time.update(elapsed);
    }

    fn non_retriable(&self) {
        self.error.mark(1);
    }

    fn exhausted(&self) {
        self.fatal.mark(1);
    }

    fn session_finished(&self, elapsed: Duration) {
        self.total_time.update(elapsed);
    }
}
