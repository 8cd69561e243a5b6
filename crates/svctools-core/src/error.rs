//! Error taxonomy for retry sessions.
//!
//! Every attempt of a retried operation either succeeds or fails with a
//! [`ClassifiedError`], which tags the underlying cause as retriable or not.
//! The orchestrator only ever looks at that flag; the cause itself travels
//! back to the caller untouched inside a [`RetryError`].

use std::error::Error;
use std::fmt;

/// Whether a failure is worth another attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retriability {
    /// Transient failure (transport errors, 5xx-class responses).
    Retriable,
    /// Permanent failure (rejected or malformed requests, 4xx-class responses).
    NonRetriable,
}

/// The failure outcome of a single attempt.
///
/// Immutable once constructed. Production classifiers always attach a cause;
/// [`ClassifiedError::transient`] exists for test doubles that need a
/// retriable failure without an observable error.
///
/// # Examples
///
/// ```rust
/// use svctools_core::error::ClassifiedError;
///
/// let err = ClassifiedError::retriable(std::io::Error::other("connection reset"));
/// assert!(err.is_retriable());
/// assert_eq!(err.cause().unwrap().to_string(), "connection reset");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError<E> {
    cause: Option<E>,
    retriable: bool,
}

impl<E> ClassifiedError<E> {
    /// A transient failure that should be retried.
    pub fn retriable(cause: E) -> Self {
        Self {
            cause: Some(cause),
            retriable: true,
        }
    }

    /// A permanent failure; retrying would waste the time budget.
    pub fn non_retriable(cause: E) -> Self {
        Self {
            cause: Some(cause),
            retriable: false,
        }
    }

    /// A retriable failure that carries no cause.
    pub fn transient() -> Self {
        Self {
            cause: None,
            retriable: true,
        }
    }

    /// Tag `cause` according to `kind`.
    pub fn from_retriability(kind: Retriability, cause: E) -> Self {
        match kind {
            Retriability::Retriable => Self::retriable(cause),
            Retriability::NonRetriable => Self::non_retriable(cause),
        }
    }

    /// Returns `true` if the failure is eligible for another attempt.
    pub fn is_retriable(&self) -> bool {
        self.retriable
    }

    /// The classification as an enum.
    pub fn retriability(&self) -> Retriability {
        if self.retriable {
            Retriability::Retriable
        } else {
            Retriability::NonRetriable
        }
    }

    /// Borrow the underlying cause, if any.
    pub fn cause(&self) -> Option<&E> {
        self.cause.as_ref()
    }

    /// Unwrap the underlying cause, if any.
    pub fn into_cause(self) -> Option<E> {
        self.cause
    }
}

impl<E: fmt::Display> fmt::Display for ClassifiedError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.retriable {
            "retriable"
        } else {
            "non-retriable"
        };
        match &self.cause {
            Some(cause) => write!(f, "{} error: {}", kind, cause),
            None => write!(f, "{} error", kind),
        }
    }
}

impl<E: Error + 'static> Error for ClassifiedError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause.as_ref().map(|e| e as &(dyn Error + 'static))
    }
}

/// Terminal failure of a retry session.
///
/// Both variants carry the original cause of the last attempt. An exhausted
/// session reports the last retriable cause rather than a synthetic timeout.
#[derive(Debug, PartialEq, Eq)]
pub enum RetryError<E> {
    /// The operation returned a non-retriable failure.
    NonRetriable {
        /// Cause reported by the failing attempt.
        cause: Option<E>,
    },
    /// The time budget elapsed while the failure was still retriable.
    Exhausted {
        /// Cause reported by the last attempt.
        cause: Option<E>,
    },
}

impl<E> RetryError<E> {
    /// Borrow the original cause.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::NonRetriable { cause } | Self::Exhausted { cause } => cause.as_ref(),
        }
    }

    /// Unwrap the original cause.
    pub fn into_cause(self) -> Option<E> {
        match self {
            Self::NonRetriable { cause } | Self::Exhausted { cause } => cause,
        }
    }

    /// Returns `true` if the session ran out of time.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }
}

impl<E: fmt::Display> fmt::Display for RetryError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.cause() {
            Some(cause) => write!(f, "{}", cause),
            None if self.is_exhausted() => write!(f, "retry budget exhausted"),
            None => write!(f, "operation failed"),
        }
    }
}

impl<E: Error + 'static> Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause().map(|e| e as &(dyn Error + 'static))
    }
}
