//! Classification of HTTP outcomes into retriable and non-retriable failures.
//!
//! Transport failures are always retriable. Responses are classified by
//! status code: the client-error list below is permanent, the server-error
//! list is transient, and everything else counts as success.

use crate::error::{ClassifiedError, Retriability};
use http::StatusCode;

/// Client-error statuses that will never succeed unmodified.
const NON_RETRIABLE_STATUSES: &[StatusCode] = &[
    StatusCode::BAD_REQUEST,
    StatusCode::UNAUTHORIZED,
    StatusCode::PAYMENT_REQUIRED,
    StatusCode::FORBIDDEN,
    StatusCode::NOT_FOUND,
    StatusCode::METHOD_NOT_ALLOWED,
    StatusCode::NOT_ACCEPTABLE,
    StatusCode::PROXY_AUTHENTICATION_REQUIRED,
    StatusCode::REQUEST_TIMEOUT,
    StatusCode::CONFLICT,
    StatusCode::GONE,
    StatusCode::LENGTH_REQUIRED,
    StatusCode::PRECONDITION_FAILED,
    StatusCode::PAYLOAD_TOO_LARGE,
    StatusCode::URI_TOO_LONG,
    StatusCode::UNSUPPORTED_MEDIA_TYPE,
    StatusCode::RANGE_NOT_SATISFIABLE,
    StatusCode::EXPECTATION_FAILED,
    StatusCode::IM_A_TEAPOT,
    StatusCode::UNPROCESSABLE_ENTITY,
    StatusCode::LOCKED,
    StatusCode::FAILED_DEPENDENCY,
    StatusCode::UPGRADE_REQUIRED,
    StatusCode::PRECONDITION_REQUIRED,
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::REQUEST_HEADER_FIELDS_TOO_LARGE,
    StatusCode::UNAVAILABLE_FOR_LEGAL_REASONS,
];

/// Server-side statuses that are likely transient.
const RETRIABLE_STATUSES: &[StatusCode] = &[
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::NOT_IMPLEMENTED,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
    StatusCode::HTTP_VERSION_NOT_SUPPORTED,
    StatusCode::VARIANT_ALSO_NEGOTIATES,
    StatusCode::INSUFFICIENT_STORAGE,
    StatusCode::LOOP_DETECTED,
    StatusCode::NOT_EXTENDED,
    StatusCode::NETWORK_AUTHENTICATION_REQUIRED,
];

/// Cause attached to a classified HTTP failure.
#[derive(Debug, thiserror::Error)]
pub enum RequestError<E> {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[source] E),

    /// The response carried a failing status.
    #[error("unexpected status: {0}")]
    Status(StatusCode),
}

impl<E> RequestError<E> {
    /// The failing status, if the request got that far.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Transport(_) => None,
            Self::Status(status) => Some(*status),
        }
    }
}

/// Anything that exposes an HTTP status code.
pub trait StatusResponse {
    /// The response status.
    fn status(&self) -> StatusCode;
}

impl<B> StatusResponse for http::Response<B> {
    fn status(&self) -> StatusCode {
        http::Response::status(self)
    }
}

#[cfg(feature = "reqwest")]
impl StatusResponse for reqwest::Response {
    fn status(&self) -> StatusCode {
        reqwest::Response::status(self)
    }
}

/// Classify a status code.
///
/// Returns `None` for statuses that should be treated as success, which
/// includes the 2xx/3xx range and any failure status not listed above.
pub fn classify_status(status: StatusCode) -> Option<Retriability> {
    if NON_RETRIABLE_STATUSES.contains(&status) {
        Some(Retriability::NonRetriable)
    } else if RETRIABLE_STATUSES.contains(&status) {
        Some(Retriability::Retriable)
    } else {
        None
    }
}

/// Classify an attempt outcome given as an optional response and an optional
/// transport error.
///
/// A transport error wins over any response. When both are absent the
/// outcome is passed through as `Ok(None)`; callers decide what an empty
/// outcome means. A failing response is dropped; only its status survives in
/// the cause.
///
/// # Examples
///
/// ```rust
/// use svctools_core::classify::classify_response;
///
/// let response = http::Response::builder().status(503).body(()).unwrap();
/// let err = classify_response::<_, std::io::Error>(Some(response), None).unwrap_err();
/// assert!(err.is_retriable());
/// ```
pub fn classify_response<R, E>(
    response: Option<R>,
    error: Option<E>,
) -> Result<Option<R>, ClassifiedError<RequestError<E>>>
where
    R: StatusResponse,
{
    if let Some(error) = error {
        return Err(ClassifiedError::retriable(RequestError::Transport(error)));
    }
    match response {
        None => Ok(None),
        Some(response) => classify_result(Ok(response)).map(Some),
    }
}

/// Classify the `Result` of a single request.
///
/// This is the form used inside retried closures:
///
/// ```rust,no_run
/// use svctools_core::classify::classify_result;
///
/// # async fn example(client: reqwest::Client) {
/// let outcome = classify_result(client.get("http://localhost/health").send().await);
/// # }
/// ```
pub fn classify_result<R, E>(outcome: Result<R, E>) -> Result<R, ClassifiedError<RequestError<E>>>
where
    R: StatusResponse,
{
    match outcome {
        Err(error) => Err(ClassifiedError::retriable(RequestError::Transport(error))),
        Ok(response) => {
            let status = response.status();
            match classify_status(status) {
                None => Ok(response),
                Some(kind) => Err(ClassifiedError::from_retriability(
                    kind,
                    RequestError::Status(status),
                )),
            }
        }
    }
}
