//! Gate verdicts and machine-readable deny reasons.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a URL was denied. Every variant is terminal: the fetch must not proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    InvalidUrl,
    DisallowedScheme,
    MissingHost,
    BlockedHostname,
    CloudMetadataEndpoint,
    Loopback,
    LinkLocal,
    PrivateRange,
    /// Only produced when the resolution-failure policy is `deny`.
    UnresolvableHost,
}

impl DenyReason {
    pub fn code(&self) -> &'static str {
        match self {
            DenyReason::InvalidUrl => "INVALID_URL",
            DenyReason::DisallowedScheme => "DISALLOWED_SCHEME",
            DenyReason::MissingHost => "MISSING_HOST",
            DenyReason::BlockedHostname => "BLOCKED_HOSTNAME",
            DenyReason::CloudMetadataEndpoint => "CLOUD_METADATA_ENDPOINT",
            DenyReason::Loopback => "LOOPBACK",
            DenyReason::LinkLocal => "LINK_LOCAL",
            DenyReason::PrivateRange => "PRIVATE_RANGE",
            DenyReason::UnresolvableHost => "UNRESOLVABLE_HOST",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A DENY verdict on its own, as returned by [`super::UrlGate::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denied {
    pub reason: DenyReason,
    pub detail: String,
}

impl Denied {
    pub fn new(reason: DenyReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for Denied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.detail)
    }
}

impl From<Denied> for GateDecision {
    fn from(d: Denied) -> Self {
        GateDecision::Deny {
            reason: d.reason,
            detail: d.detail,
        }
    }
}

/// Outcome of one gate evaluation. Computed fresh per URL and per redirect hop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GateDecision {
    Allow,
    Deny { reason: DenyReason, detail: String },
}

impl GateDecision {
    pub fn deny(reason: DenyReason, detail: impl Into<String>) -> Self {
        GateDecision::Deny {
            reason,
            detail: detail.into(),
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }

    pub fn reason(&self) -> Option<DenyReason> {
        match self {
            GateDecision::Allow => None,
            GateDecision::Deny { reason, .. } => Some(*reason),
        }
    }
}

impl fmt::Display for GateDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateDecision::Allow => f.write_str("ALLOW"),
            GateDecision::Deny { reason, detail } => write!(f, "DENY {reason}: {detail}"),
        }
    }
}
