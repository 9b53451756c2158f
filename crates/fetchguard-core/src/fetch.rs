//! Gate-checked fetching with manual redirect handling.
//!
//! Flow per request: gate → send → (on redirect) resolve `Location` → gate
//! again → send. A redirect target that the gate denies is never requested.
//! Each hop is sent as the URL the gate parsed, pinned to the addresses the
//! gate checked.

use std::sync::Arc;

use crate::gate::{AdmittedUrl, DenyReason, UrlGate};
use crate::http::{HttpRequest, HttpResponse, Method, Transport, TransportError};

/// Default redirect budget.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("refusing to fetch {url}: {reason} ({detail})")]
    Denied {
        url: String,
        reason: DenyReason,
        detail: String,
    },
    #[error("too many redirects (limit {limit}) starting at {url}")]
    TooManyRedirects { url: String, limit: u32 },
    #[error("redirect from {from} has invalid Location {location:?}")]
    BadRedirect { from: String, location: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl FetchError {
    /// Deny reason if the gate blocked the request or one of its redirects.
    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            FetchError::Denied { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

/// Final response plus the redirect chain that led to it.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    pub response: HttpResponse,
    /// Every URL requested, in order; the last one produced `response`.
    pub hops: Vec<String>,
}

impl FetchedResponse {
    pub fn final_url(&self) -> &str {
        &self.response.url
    }

    pub fn redirected(&self) -> bool {
        self.hops.len() > 1
    }
}

/// Sends requests only to URLs the gate allows, re-checking every redirect hop.
#[derive(Clone)]
pub struct GuardedFetcher {
    gate: UrlGate,
    transport: Arc<dyn Transport>,
    max_redirects: u32,
}

impl GuardedFetcher {
    pub fn new(gate: UrlGate, transport: Arc<dyn Transport>) -> Self {
        Self {
            gate,
            transport,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn gate(&self) -> &UrlGate {
        &self.gate
    }

    fn admit(&self, url: &str) -> Result<AdmittedUrl, FetchError> {
        self.gate.admit(url).map_err(|d| FetchError::Denied {
            url: url.to_string(),
            reason: d.reason,
            detail: d.detail,
        })
    }

    /// GET `url` through the gate.
    pub fn get(&self, url: &str) -> Result<FetchedResponse, FetchError> {
        self.fetch(HttpRequest::get(url))
    }

    pub fn fetch(&self, request: HttpRequest) -> Result<FetchedResponse, FetchError> {
        let start_url = request.url.clone();
        let mut current = request;
        let mut hops: Vec<String> = Vec::new();

        loop {
            let admitted = self.admit(&current.url)?;
            current.url = admitted.as_str().to_string();
            current.pin = admitted.pin();
            hops.push(current.url.clone());
            tracing::info!(method = %current.method, url = %current.url, "fetching");
            let response = self.transport.execute(&current)?;

            let location = if response.is_redirect() {
                response.location().map(str::to_string)
            } else {
                None
            };
            let location = match location {
                Some(loc) => loc,
                None => return Ok(FetchedResponse { response, hops }),
            };

            if hops.len() > self.max_redirects as usize {
                return Err(FetchError::TooManyRedirects {
                    url: start_url,
                    limit: self.max_redirects,
                });
            }

            let next_url = resolve_location(&current.url, &location).ok_or_else(|| {
                FetchError::BadRedirect {
                    from: current.url.clone(),
                    location: location.clone(),
                }
            })?;
            tracing::info!(
                from = %current.url,
                to = %next_url,
                status = response.status,
                "redirect"
            );
            current = next_request(current, response.status, next_url);
        }
    }
}

/// Resolves a `Location` value against the URL that returned it.
fn resolve_location(base: &str, location: &str) -> Option<String> {
    let base = url::Url::parse(base).ok()?;
    base.join(location.trim()).ok().map(|u| u.to_string())
}

/// 303 always becomes GET; 301/302 turn non-GET/HEAD into GET; 307/308 keep the request.
fn next_request(prev: HttpRequest, status: u32, url: String) -> HttpRequest {
    let to_get = match status {
        303 => prev.method != Method::Head,
        301 | 302 => !matches!(prev.method, Method::Get | Method::Head),
        _ => false,
    };
    if to_get {
        let headers = prev
            .headers
            .into_iter()
            .filter(|(k, _)| {
                !k.eq_ignore_ascii_case("content-type") && !k.eq_ignore_ascii_case("content-length")
            })
            .collect();
        HttpRequest {
            method: Method::Get,
            url,
            headers,
            body: None,
            pin: None,
        }
    } else {
        HttpRequest { url, ..prev }
    }
}
