//! Retry sessions with backoff, jitter, and a single deadline.
//!
//! This module contains the pieces of a retry session:
//!
//! - [`Backoff`] / [`Jitter`] - pure delay strategies
//! - [`JitteredBackoff`] - the deadline-aware waiter
//! - [`retry`] and friends - the loop that drives an operation to completion
//!
//! # Examples
//!
//! ```rust
//! use svctools_core::error::ClassifiedError;
//! use svctools_core::retry::retry_exponential;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let value = retry_exponential(
//!     || async { Ok::<_, ClassifiedError<std::io::Error>>(42) },
//!     Duration::from_secs(30),
//!     Duration::from_millis(100),
//!     Duration::from_millis(50),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

mod run;
mod strategy;
mod waiter;

pub use run::{
    RetryResult, retry, retry_cancellable, retry_exponential, retry_immediate, retry_linear,
    retry_observed, retry_periodic, retry_with_backoff,
};
pub use strategy::{Backoff, Jitter, UnknownBackoff};
pub use waiter::{JitteredBackoff, JitteredBackoffBuilder, Perishable, PerishableWaiter, Waiter};
