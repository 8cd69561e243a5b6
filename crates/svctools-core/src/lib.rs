#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Deadline-aware retries for service clients.
//!
//! This crate drives a fallible operation until it succeeds, fails
//! permanently, or runs out of its time budget:
//!
//! - **Error taxonomy** via [`ClassifiedError`](error::ClassifiedError)
//!   - HTTP outcome classification in [`classify`]
//! - **Backoff and jitter** via [`Backoff`](retry::Backoff) and [`Jitter`](retry::Jitter)
//!   - None, constant, linear, and overflow-safe exponential growth
//! - **Deadline-aware waiting** via [`JitteredBackoff`](retry::JitteredBackoff)
//! - **Retry sessions** via [`retry`](retry::retry) and the
//!   periodic/linear/exponential entry points
//! - **Instrumentation seam** via [`RetryObserver`](observe::RetryObserver)
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use svctools_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RetryConfig {
//!     timeout: Duration::from_secs(10),
//!     backoff: Backoff::Linear,
//!     ..Default::default()
//! };
//!
//! let value = config
//!     .retry(|| async { Ok::<_, ClassifiedError<std::io::Error>>(42) })
//!     .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod observe;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use svctools_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::classify::{RequestError, StatusResponse, classify_response, classify_result};
    pub use crate::config::RetryConfig;
    pub use crate::error::{ClassifiedError, Retriability, RetryError};
    pub use crate::observe::{NoopObserver, RetryObserver};
    pub use crate::retry::{
        Backoff, Jitter, JitteredBackoff, Perishable, PerishableWaiter, RetryResult, Waiter, retry,
        retry_exponential, retry_linear, retry_periodic,
    };
}
