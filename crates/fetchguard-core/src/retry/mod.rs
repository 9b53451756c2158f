//! Retry and backoff policy.
//!
//! Outcome classification (server errors, timeouts, connection failures) plus
//! exponential backoff, shared by the API client and other callers.

mod classify;
mod policy;
mod run;

pub use classify::{classify_http_status, classify_response, classify_transport_error};
pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::run_with_retry;
