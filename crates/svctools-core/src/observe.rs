//! Write-only observation of retry sessions.
//!
//! Observers are notified as the retry loop progresses; they never influence
//! control flow. A panicking observer is contained and logged so that
//! instrumentation can never abort a retry.

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

/// Receives notifications from the retry loop. Every method defaults to a no-op.
pub trait RetryObserver: Send + Sync {
    /// An attempt is about to run.
    fn attempt_started(&self) {}

    /// An attempt returned after `elapsed`.
    fn attempt_finished(&self, elapsed: Duration) {
        let _ = elapsed;
    }

    /// The session failed with a non-retriable error.
    fn non_retriable(&self) {}

    /// The session ran out of time with a retriable error outstanding.
    fn exhausted(&self) {}

    /// The session ended, successfully or not, after `elapsed`.
    fn session_finished(&self, elapsed: Duration) {
        let _ = elapsed;
    }
}

/// Observer that ignores every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {}

impl<O: RetryObserver + ?Sized> RetryObserver for &O {
    fn attempt_started(&self) {
        (**self).attempt_started()
    }

    fn attempt_finished(&self, elapsed: Duration) {
        (**self).attempt_finished(elapsed)
    }

    fn non_retriable(&self) {
        (**self).non_retriable()
    }

    fn exhausted(&self) {
        (**self).exhausted()
    }

    fn session_finished(&self, elapsed: Duration) {
        (**self).session_finished(elapsed)
    }
}

/// Run an observer callback, swallowing any panic.
pub(crate) fn notify(hook: &'static str, f: impl FnOnce()) {
    if panic::catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!(hook, "Retry observer panicked; ignoring");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_notify_contains_panics() {
        let calls = AtomicU32::new(0);
        notify("attempt_started", || {
            calls.fetch_add(1, Ordering::SeqCst);
            panic!("sink unavailable");
        });
        notify("attempt_started", || {
            calls.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
