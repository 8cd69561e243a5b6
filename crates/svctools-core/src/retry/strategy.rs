//! Backoff and jitter strategies.
//!
//! Both are pure: given the same inputs (and, for jitter, the same random
//! source) they always produce the same delay.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// How the delay between attempts grows with the round number.
///
/// Rounds are zero-based: round `0` is the wait after the first failed
/// attempt. A zero base interval always yields a zero delay.
///
/// # Examples
///
/// ```rust
/// use svctools_core::retry::Backoff;
/// use std::time::Duration;
///
/// let base = Duration::from_millis(100);
/// assert_eq!(Backoff::Constant.delay(4, base), base);
/// assert_eq!(Backoff::Linear.delay(2, base), Duration::from_millis(300));
/// assert_eq!(Backoff::Exponential.delay(3, base), Duration::from_millis(800));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    /// Always zero.
    None,
    /// Always the base interval. Also accepted as `periodic`.
    #[serde(alias = "periodic")]
    Constant,
    /// `(round + 1) * base`.
    Linear,
    /// `base << round`, clamped to `base` when the shift overflows.
    #[default]
    Exponential,
}

impl Backoff {
    /// Compute the delay before the next attempt.
    pub fn delay(self, round: u32, base: Duration) -> Duration {
        if base.is_zero() {
            return Duration::ZERO;
        }
        match self {
            Self::None => Duration::ZERO,
            Self::Constant => base,
            Self::Linear => base.saturating_mul(round.saturating_add(1)),
            Self::Exponential => shift_or_clamp(base, round),
        }
    }

    /// Lowercase name of the strategy.
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Constant => "constant",
            Self::Linear => "linear",
            Self::Exponential => "exponential",
        }
    }
}

/// A backoff name that is none of the known families.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backoff strategy: {0}")]
pub struct UnknownBackoff(pub String);

impl std::str::FromStr for Backoff {
    type Err = UnknownBackoff;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "constant" | "periodic" => Ok(Self::Constant),
            "linear" => Ok(Self::Linear),
            "exponential" => Ok(Self::Exponential),
            other => Err(UnknownBackoff(other.to_string())),
        }
    }
}

/// `base << round`, or `base` itself if the result is not representable.
fn shift_or_clamp(base: Duration, round: u32) -> Duration {
    let nanos = base.as_nanos();
    if round >= u128::BITS || nanos.leading_zeros() < round {
        return base;
    }
    let shifted = nanos << round;
    match u64::try_from(shifted / NANOS_PER_SEC) {
        // remainder is always below one second
        Ok(secs) => Duration::new(secs, (shifted % NANOS_PER_SEC) as u32),
        Err(_) => base,
    }
}

/// Random delay added on top of the backoff delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Jitter {
    /// Always zero.
    None,
    /// Uniform in `[0, max)` at millisecond granularity.
    #[default]
    Uniform,
}

impl Jitter {
    /// Draw a jitter delay no larger than `max`.
    ///
    /// The result is always strictly below `max`, and zero whenever `max` is
    /// zero. Ceilings under one millisecond always yield zero.
    pub fn delay<R: Rng + ?Sized>(self, max: Duration, rng: &mut R) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Uniform => {
                let ceiling = max.as_millis().min(u64::MAX as u128) as u64;
                if ceiling == 0 {
                    return Duration::ZERO;
                }
                Duration::from_millis(rng.gen_range(0..ceiling))
            }
        }
    }
}
