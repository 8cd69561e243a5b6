//! Configuration for retry sessions.

use crate::error::ClassifiedError;
use crate::observe::RetryObserver;
use crate::retry::{self, Backoff, Jitter, JitteredBackoff, RetryResult, UnknownBackoff};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// Errors raised while loading a [`RetryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("invalid retry configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// `SVCTOOLS_RETRY_BACKOFF` named an unknown family.
    #[error("invalid value for SVCTOOLS_RETRY_BACKOFF: {0}")]
    Backoff(#[from] UnknownBackoff),

    /// An environment variable held a malformed value.
    #[error("invalid value {value:?} for {var}: {reason}")]
    Env {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Parameters of a retry session.
///
/// Durations are expressed in whole milliseconds when serialized:
///
/// ```toml
/// timeout_ms = 30000
/// interval_ms = 100
/// max_jitter_ms = 50
/// backoff = "exponential"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total time budget for the session.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Duration,

    /// Base interval fed to the backoff strategy.
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,

    /// Jitter ceiling.
    #[serde(rename = "max_jitter_ms", with = "millis")]
    pub max_jitter: Duration,

    /// Backoff family.
    pub backoff: Backoff,

    /// Seed for the jitter source; entropy when unset.
    pub seed: Option<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_millis(100),
            max_jitter: Duration::from_millis(50),
            backoff: Backoff::Exponential,
            seed: None,
        }
    }
}

impl RetryConfig {
    /// Parse a configuration from TOML. Missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `SVCTOOLS_RETRY_TIMEOUT_MS` for the total time budget
    /// - `SVCTOOLS_RETRY_INTERVAL_MS` for the base interval
    /// - `SVCTOOLS_RETRY_MAX_JITTER_MS` for the jitter ceiling
    /// - `SVCTOOLS_RETRY_BACKOFF` for the backoff family
    /// - `SVCTOOLS_RETRY_SEED` for the jitter seed
    pub fn from_env() -> Result<Self, ConfigError> {
        use std::env;

        let mut config = Self::default();

        if let Ok(value) = env::var("SVCTOOLS_RETRY_TIMEOUT_MS") {
            config.timeout = parse_millis("SVCTOOLS_RETRY_TIMEOUT_MS", value)?;
        }
        if let Ok(value) = env::var("SVCTOOLS_RETRY_INTERVAL_MS") {
            config.interval = parse_millis("SVCTOOLS_RETRY_INTERVAL_MS", value)?;
        }
        if let Ok(value) = env::var("SVCTOOLS_RETRY_MAX_JITTER_MS") {
            config.max_jitter = parse_millis("SVCTOOLS_RETRY_MAX_JITTER_MS", value)?;
        }
        if let Ok(value) = env::var("SVCTOOLS_RETRY_BACKOFF") {
            config.backoff = value.parse()?;
        }
        if let Ok(value) = env::var("SVCTOOLS_RETRY_SEED") {
            config.seed = Some(parse_integer("SVCTOOLS_RETRY_SEED", value)?);
        }

        Ok(config)
    }

    /// Build an unarmed waiter for one session.
    pub fn waiter(&self) -> JitteredBackoff {
        let builder = JitteredBackoff::builder()
            .ttl(self.timeout)
            .initial(self.interval)
            .max_jitter(self.max_jitter)
            .backoff(self.backoff)
            .jitter(Jitter::Uniform);
        match self.seed {
            Some(seed) => builder.seed(seed).build(),
            None => builder.build(),
        }
    }

    /// Run a retry session with these parameters.
    pub async fn retry<F, Fut, T, E>(&self, operation: F) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError<E>>>,
        E: Send,
    {
        retry::retry(operation, &mut self.waiter()).await
    }

    /// Run a retry session reporting to `observer`.
    pub async fn retry_observed<F, Fut, T, E, O>(&self, operation: F, observer: &O) -> RetryResult<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ClassifiedError<E>>>,
        E: Send,
        O: RetryObserver + ?Sized,
    {
        retry::retry_observed(operation, &mut self.waiter(), observer).await
    }
}

fn parse_millis(var: &'static str, value: String) -> Result<Duration, ConfigError> {
    parse_integer(var, value).map(Duration::from_millis)
}

/// Parse a non-negative integer that TOML can also hold (at most `i64::MAX`).
fn parse_integer(var: &'static str, value: String) -> Result<u64, ConfigError> {
    match value.trim().parse::<i64>() {
        Ok(n) => u64::try_from(n).map_err(|_| ConfigError::Env {
            var,
            value,
            reason: "must not be negative".to_string(),
        }),
        Err(e) => Err(ConfigError::Env {
            var,
            value,
            reason: e.to_string(),
        }),
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        // TOML integers are signed 64-bit
        let ms = i64::try_from(value.as_millis()).unwrap_or(i64::MAX);
        serializer.serialize_i64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
