//! Classify HTTP status and transport errors into retry policy error kinds.

use crate::http::{HttpResponse, TransportError};
use crate::retry::policy::ErrorKind;

/// Classify an HTTP status code: anything below 500 is final.
pub fn classify_http_status(code: u32) -> ErrorKind {
    if code >= 500 {
        ErrorKind::Http5xx(u16::try_from(code).unwrap_or(u16::MAX))
    } else {
        ErrorKind::Other
    }
}

/// Classify a transport failure. Every network-level error is retryable.
pub fn classify_transport_error(e: &TransportError) -> ErrorKind {
    match e {
        TransportError::Curl(ce) if ce.is_operation_timedout() => ErrorKind::Timeout,
        TransportError::Curl(_) => ErrorKind::Connection,
        TransportError::InvalidRequest(_) => ErrorKind::Other,
    }
}

/// Classify the outcome of one request attempt.
pub fn classify_response(outcome: &Result<HttpResponse, TransportError>) -> ErrorKind {
    match outcome {
        Ok(resp) => classify_http_status(resp.status),
        Err(e) => classify_transport_error(e),
    }
}
