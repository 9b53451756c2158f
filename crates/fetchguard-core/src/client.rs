//! JSON REST client with bounded retries and per-client rate limiting.

use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GuardConfig;
use crate::gate::{DenyReason, UrlGate};
use crate::http::{
    CurlTransport, HttpRequest, HttpResponse, Method, ResponseHeaders, Transport, TransportError,
};
use crate::rate_limit::RateLimiter;
use crate::retry::{classify_response, run_with_retry, RetryPolicy};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("refusing to call {url}: {reason} ({detail})")]
    Denied {
        url: String,
        reason: DenyReason,
        detail: String,
    },
    #[error("API error {status}: {body}")]
    Status { status: u32, body: Value },
    #[error("request failed after retries: {0}")]
    Transport(#[from] TransportError),
}

impl ApiError {
    pub fn status(&self) -> Option<u32> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Successful (2xx) API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u32,
    /// Parsed JSON body, or the raw text as a JSON string if it is not JSON.
    pub data: Value,
    pub headers: ResponseHeaders,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn body_value(resp: &HttpResponse) -> Value {
    if resp.body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&resp.body).unwrap_or_else(|_| Value::String(resp.text()))
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Sent as `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    pub retry: RetryPolicy,
    /// Minimum spacing between calls of this client; `None` disables limiting.
    pub min_interval: Option<Duration>,
}

pub struct ApiClient {
    base_url: String,
    api_key: Option<String>,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
    limiter: Option<RateLimiter>,
    gate: Option<UrlGate>,
}

impl ApiClient {
    pub fn new(base_url: &str, transport: Arc<dyn Transport>, options: ClientOptions) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: options.api_key,
            transport,
            retry: options.retry,
            limiter: options
                .min_interval
                .filter(|d| !d.is_zero())
                .map(RateLimiter::new),
            gate: None,
        }
    }

    /// Checks every request URL with `gate` and pins it to the checked addresses.
    pub fn with_gate(mut self, gate: UrlGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Client using libcurl and the retry/rate-limit settings from `cfg`.
    pub fn from_config(base_url: &str, cfg: &GuardConfig, api_key: Option<String>) -> Self {
        let options = ClientOptions {
            api_key,
            retry: cfg.retry.to_policy(),
            min_interval: Some(cfg.rate_limit.min_interval()),
        };
        Self::new(
            base_url,
            Arc::new(CurlTransport::from_config(&cfg.http)),
            options,
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the base URL and `endpoint` with exactly one `/` between them.
    pub fn build_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn url_with_query(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<String, ApiError> {
        let raw = self.build_url(endpoint);
        let mut url = url::Url::parse(&raw).map_err(|e| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url.to_string())
    }

    /// Sends one logical request: rate limit, then up to `retry.max_attempts` tries.
    ///
    /// Statuses >= 500 and transport errors are retried; anything else is final.
    /// A non-2xx final status becomes [`ApiError::Status`]. With a gate, the
    /// URL is checked once and every attempt is pinned to the checked addresses.
    pub fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url_with_query(endpoint, query)?;
        let (url, pin) = match &self.gate {
            Some(gate) => {
                let admitted = gate.admit(&url).map_err(|d| ApiError::Denied {
                    url: url.clone(),
                    reason: d.reason,
                    detail: d.detail,
                })?;
                (admitted.as_str().to_string(), admitted.pin())
            }
            None => (url, None),
        };

        let mut req = HttpRequest::new(method, url.as_str())
            .pinned(pin)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }
        if let Some(v) = body {
            req = req.json(v);
        }

        if let Some(limiter) = &self.limiter {
            limiter.acquire();
        }

        let max = self.retry.max_attempts;
        let resp = run_with_retry(
            &self.retry,
            |attempt| {
                tracing::info!("{} {} (attempt {}/{})", method, url, attempt, max);
                self.transport.execute(&req)
            },
            classify_response,
        )?;

        let data = body_value(&resp);
        if !resp.is_success() {
            tracing::error!(status = resp.status, "API error for {} {}", method, url);
            return Err(ApiError::Status {
                status: resp.status,
                body: data,
            });
        }
        Ok(ApiResponse {
            status: resp.status,
            data,
            headers: resp.headers,
        })
    }

    pub fn get(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<ApiResponse, ApiError> {
        self.request(Method::Get, endpoint, query, None)
    }

    pub fn post(&self, endpoint: &str, data: &Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::Post, endpoint, &[], Some(data))
    }

    pub fn put(&self, endpoint: &str, data: &Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::Put, endpoint, &[], Some(data))
    }

    pub fn patch(&self, endpoint: &str, data: &Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::Patch, endpoint, &[], Some(data))
    }

    pub fn delete(&self, endpoint: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Delete, endpoint, &[], None)
    }
}

/// Typed helpers for a conventional `/users` resource.
pub struct UserApi<'a> {
    client: &'a ApiClient,
}

impl<'a> UserApi<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub fn get_user(&self, user_id: u64) -> Result<Value, ApiError> {
        Ok(self.client.get(&format!("/users/{user_id}"), &[])?.data)
    }

    pub fn create_user(&self, user: &Value) -> Result<Value, ApiError> {
        Ok(self.client.post("/users", user)?.data)
    }

    pub fn update_user(&self, user_id: u64, user: &Value) -> Result<Value, ApiError> {
        Ok(self.client.put(&format!("/users/{user_id}"), user)?.data)
    }

    pub fn delete_user(&self, user_id: u64) -> Result<bool, ApiError> {
        Ok(self.client.delete(&format!("/users/{user_id}"))?.is_success())
    }

    pub fn list_users(&self, page: u32, per_page: u32) -> Result<Value, ApiError> {
        let page = page.to_string();
        let per_page = per_page.to_string();
        Ok(self
            .client
            .get("/users", &[("page", &page), ("per_page", &per_page)])?
            .data)
    }
}
