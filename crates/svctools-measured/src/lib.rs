#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Metrics collectors for retry sessions.
//!
//! [`Collectors`] bundles the five sinks a retry session reports to and plugs
//! into the core loop as a [`RetryObserver`](svctools_core::observe::RetryObserver):
//!
//! | Sink           | Kind    | Updated when                                 |
//! |----------------|---------|----------------------------------------------|
//! | `attempt`      | meter   | an attempt starts                            |
//! | `error`        | meter   | a non-retriable error ends the session       |
//! | `fatal`        | meter   | the time budget runs out                     |
//! | `attempt_time` | timer   | an attempt returns                           |
//! | `total_time`   | timer   | the session ends                             |
//!
//! Sinks are write-only; nothing here reads them back.
//!
//! # Examples
//!
//! ```rust
//! use svctools_core::error::ClassifiedError;
//! use svctools_measured::{InMemoryCollectors, retry_exponential};
//! use std::time::Duration;
//!
//! # async fn example() {
//! let metrics = InMemoryCollectors::new();
//!
//! let result = retry_exponential(
//!     || async { Ok::<_, ClassifiedError<std::io::Error>>("ok") },
//!     Duration::from_secs(5),
//!     Duration::from_millis(50),
//!     Duration::from_millis(10),
//!     &metrics.collectors(),
//! )
//! .await;
//!
//! assert!(result.is_ok());
//! assert_eq!(metrics.attempt.count(), 1);
//! # }
//! ```

mod collectors;
mod memory;
mod run;

pub use collectors::{Collectors, Meter, NoopSink, Timer};
pub use memory::{AtomicMeter, AtomicTimer, InMemoryCollectors};
pub use run::{retry, retry_exponential, retry_immediate, retry_linear, retry_periodic};
