//! Deadline-aware waiting between attempts.

use super::strategy::{Backoff, Jitter};
use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::time::Duration;
use tokio::time::{self, Instant};

/// Something with a lifetime that starts when armed.
pub trait Perishable {
    /// Arm the deadline. Calling it again re-arms from the current time.
    fn start(&mut self);

    /// Returns `true` once [`start`](Perishable::start) has been called.
    ///
    /// This is a liveness probe, not a check of whether the deadline has
    /// already elapsed.
    fn is_dying(&self) -> bool;
}

/// Blocks between attempts until either the next attempt is due or the
/// deadline passes.
#[async_trait]
pub trait Waiter: Send {
    /// Wait for the next attempt.
    ///
    /// Returns `Ok(())` when the caller should try again, or hands `cause`
    /// back unchanged once the deadline has passed.
    async fn wait_or_die<E: Send>(&mut self, cause: E) -> Result<(), E>;
}

/// A waiter with an armed deadline; what the retry loop drives.
pub trait PerishableWaiter: Perishable + Waiter {}

impl<W: Perishable + Waiter> PerishableWaiter for W {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deadline {
    At(Instant),
    // ttl too large for the clock
    Never,
}

/// Waiter that sleeps for a backoff delay plus random jitter, racing the
/// sleep against a single session deadline.
///
/// One instance belongs to one retry session; it is not meant to be shared.
///
/// # Examples
///
/// ```rust
/// use svctools_core::retry::{Backoff, Jitter, JitteredBackoff, Perishable, Waiter};
/// use std::time::Duration;
///
/// # async fn example() {
/// let mut waiter = JitteredBackoff::builder()
///     .ttl(Duration::from_secs(5))
///     .initial(Duration::from_millis(100))
///     .backoff(Backoff::Exponential)
///     .jitter(Jitter::None)
///     .build();
///
/// waiter.start();
/// assert!(waiter.wait_or_die("still failing").await.is_ok());
/// assert_eq!(waiter.round(), 1);
/// # }
/// ```
#[derive(Debug)]
pub struct JitteredBackoff {
    ttl: Duration,
    initial: Duration,
    max_jitter: Duration,
    backoff: Option<Backoff>,
    jitter: Option<Jitter>,
    deadline: Option<Deadline>,
    round: u32,
    rng: StdRng,
}

impl JitteredBackoff {
    /// Create a waiter with uniform jitter and an entropy-seeded random source.
    pub fn new(ttl: Duration, initial: Duration, max_jitter: Duration, backoff: Backoff) -> Self {
        Self::builder()
            .ttl(ttl)
            .initial(initial)
            .max_jitter(max_jitter)
            .backoff(backoff)
            .jitter(Jitter::Uniform)
            .build()
    }

    /// Create a builder. Strategies left unset stay unset.
    pub fn builder() -> JitteredBackoffBuilder {
        JitteredBackoffBuilder::default()
    }

    /// Number of completed waits.
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Total time budget of the session.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn next_delay(&mut self) -> Duration {
        let Some(backoff) = self.backoff else {
            panic!("JitteredBackoff: backoff strategy is not set");
        };
        let Some(jitter) = self.jitter else {
            panic!("JitteredBackoff: jitter strategy is not set");
        };
        backoff
            .delay(self.round, self.initial)
            .saturating_add(jitter.delay(self.max_jitter, &mut self.rng))
    }
}

impl Perishable for JitteredBackoff {
    fn start(&mut self) {
        let deadline = Instant::now()
            .checked_add(self.ttl)
            .map_or(Deadline::Never, Deadline::At);
        self.deadline = Some(deadline);
    }

    fn is_dying(&self) -> bool {
        self.deadline.is_some()
    }
}

#[async_trait]
impl Waiter for JitteredBackoff {
    async fn wait_or_die<E: Send>(&mut self, cause: E) -> Result<(), E> {
        let delay = self.next_delay();

        match self.deadline {
            Some(Deadline::At(deadline)) => {
                if Instant::now() >= deadline {
                    return Err(cause);
                }
                // ties go to the deadline
                tokio::select! {
                    biased;
                    _ = time::sleep_until(deadline) => return Err(cause),
                    _ = time::sleep(delay) => {}
                }
            }
            // unarmed or unbounded: nothing to race against
            Some(Deadline::Never) | None => time::sleep(delay).await,
        }

        self.round = self.round.saturating_add(1);
        tracing::debug!(
            round = self.round,
            delay_ms = delay.as_millis() as u64,
            "Backoff wait completed"
        );
        Ok(())
    }
}

/// Builder for [`JitteredBackoff`].
#[derive(Debug, Default)]
pub struct JitteredBackoffBuilder {
    ttl: Duration,
    initial: Duration,
    max_jitter: Duration,
    backoff: Option<Backoff>,
    jitter: Option<Jitter>,
    rng: Option<StdRng>,
}

impl JitteredBackoffBuilder {
    /// Total time budget, measured from [`Perishable::start`].
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Base interval fed to the backoff strategy.
    pub fn initial(mut self, initial: Duration) -> Self {
        self.initial = initial;
        self
    }

    /// Jitter ceiling.
    pub fn max_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Backoff strategy.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Jitter strategy.
    pub fn jitter(mut self, jitter: Jitter) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Seed the jitter source for reproducible delays.
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(StdRng::seed_from_u64(seed));
        self
    }

    /// Use a specific random source.
    pub fn rng(mut self, rng: StdRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Build the waiter. It stays unarmed until [`Perishable::start`].
    pub fn build(self) -> JitteredBackoff {
        JitteredBackoff {
            ttl: self.ttl,
            initial: self.initial,
            max_jitter: self.max_jitter,
            backoff: self.backoff,
            jitter: self.jitter,
            deadline: None,
            round: 0,
            rng: self.rng.unwrap_or_else(StdRng::from_entropy),
        }
    }
}
