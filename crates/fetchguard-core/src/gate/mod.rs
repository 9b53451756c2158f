//! Outbound URL safety gate (SSRF guard).
//!
//! Decides ALLOW or DENY for a URL before any network request is issued.
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. the text parses as a URL
//! 2. the scheme is allowed (`http`/`https` by default)
//! 3. there is a host
//! 4. the host is not a denylisted name (`localhost`, ...)
//! 5. literal IP hosts are classified directly, names are resolved
//! 6. every address must be public; one private answer taints the host
//!
//! The gate keeps no state between calls, so redirect targets must be run
//! through [`UrlGate::admit`] again before they are followed. Callers send the
//! URL the gate parsed and connect only to the addresses it checked.

mod classify;
mod decision;
mod target;

pub use classify::{classify_ip, AddressClass, CLOUD_METADATA_V4};
pub use decision::{Denied, DenyReason, GateDecision};
pub use target::{parse_target, Target, TargetError, TargetHost};

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::str::FromStr;
use std::sync::Arc;

use crate::http::HostPin;
use crate::resolver::{HostResolver, SystemResolver};

/// What the gate does when a hostname cannot be resolved.
///
/// `Allow` lets the URL through and leaves the failure to the fetch itself;
/// `Deny` rejects it as `UNRESOLVABLE_HOST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionFailurePolicy {
    #[default]
    Allow,
    Deny,
}

impl FromStr for ResolutionFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(ResolutionFailurePolicy::Allow),
            "deny" => Ok(ResolutionFailurePolicy::Deny),
            other => Err(format!("expected allow or deny, got {other:?}")),
        }
    }
}

/// Rule set for a [`UrlGate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOptions {
    pub allowed_schemes: Vec<String>,
    pub blocked_hostnames: Vec<String>,
    pub on_resolution_failure: ResolutionFailurePolicy,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["http".to_string(), "https".to_string()],
            blocked_hostnames: vec![
                "localhost".to_string(),
                "localhost.localdomain".to_string(),
            ],
            on_resolution_failure: ResolutionFailurePolicy::Allow,
        }
    }
}

impl GateOptions {
    fn normalized(mut self) -> Self {
        for s in &mut self.allowed_schemes {
            *s = s.trim().to_ascii_lowercase();
        }
        for h in &mut self.blocked_hostnames {
            *h = normalize_host(h);
        }
        self
    }
}

fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Stateless URL checker. Cheap to clone and safe to share across threads.
#[derive(Clone)]
pub struct UrlGate {
    options: GateOptions,
    resolver: Arc<dyn HostResolver>,
}

impl std::fmt::Debug for UrlGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlGate")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl UrlGate {
    pub fn new(options: GateOptions, resolver: Arc<dyn HostResolver>) -> Self {
        Self {
            options: options.normalized(),
            resolver,
        }
    }

    /// Gate that resolves names with the platform resolver.
    pub fn with_system_resolver(options: GateOptions) -> Self {
        Self::new(options, Arc::new(SystemResolver))
    }

    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Evaluates `url_text` against the full rule set. Never panics on malformed input.
    pub fn evaluate(&self, url_text: &str) -> GateDecision {
        match self.admit(url_text) {
            Ok(_) => GateDecision::Allow,
            Err(denied) => denied.into(),
        }
    }

    /// Like [`evaluate`](Self::evaluate), but an ALLOW carries the parsed URL
    /// and the addresses that were checked. Requests must be sent to
    /// `admitted.url` pinned to those addresses, not to the original text.
    pub fn admit(&self, url_text: &str) -> Result<AdmittedUrl, Denied> {
        let verdict = self.decide(url_text);
        match &verdict {
            Ok(admitted) => tracing::debug!(
                url = %url_text,
                addresses = ?admitted.addresses,
                "gate allowed"
            ),
            Err(denied) => tracing::info!(
                url = %url_text,
                reason = %denied.reason,
                "gate denied: {}",
                denied.detail
            ),
        }
        verdict
    }

    fn decide(&self, url_text: &str) -> Result<AdmittedUrl, Denied> {
        let target = match parse_target(url_text) {
            Ok(t) => t,
            Err(TargetError::EmptyHost { scheme }) => {
                if !self.scheme_allowed(&scheme) {
                    return Err(Denied::new(
                        DenyReason::DisallowedScheme,
                        format!("scheme {scheme:?} is not allowed"),
                    ));
                }
                return Err(Denied::new(DenyReason::MissingHost, "URL has no host"));
            }
            Err(TargetError::Invalid(e)) => return Err(Denied::new(DenyReason::InvalidUrl, e)),
        };

        if !self.scheme_allowed(&target.scheme) {
            return Err(Denied::new(
                DenyReason::DisallowedScheme,
                format!("scheme {:?} is not allowed", target.scheme),
            ));
        }

        let host = match &target.host {
            Some(h) => h,
            None => return Err(Denied::new(DenyReason::MissingHost, "URL has no host")),
        };

        let host_name = normalize_host(&target.host_text);
        if self.options.blocked_hostnames.contains(&host_name) {
            return Err(Denied::new(
                DenyReason::BlockedHostname,
                format!("host {host_name} is blocked"),
            ));
        }

        let addresses = match host {
            TargetHost::Ip(ip) => {
                check_addresses(&host_name, &[*ip])?;
                vec![*ip]
            }
            TargetHost::Domain(name) => {
                let name = normalize_host(name);
                match self.resolver.resolve(&name) {
                    Ok(addrs) if !addrs.is_empty() => {
                        check_addresses(&name, &addrs)?;
                        addrs
                    }
                    Ok(_) => {
                        self.unresolved(&name, "no addresses returned")?;
                        Vec::new()
                    }
                    Err(e) => {
                        self.unresolved(&name, &e.to_string())?;
                        Vec::new()
                    }
                }
            }
        };

        Ok(AdmittedUrl {
            url: target.url,
            addresses,
        })
    }

    fn scheme_allowed(&self, scheme: &str) -> bool {
        let scheme = scheme.to_ascii_lowercase();
        self.options.allowed_schemes.iter().any(|s| *s == scheme)
    }

    fn unresolved(&self, host: &str, why: &str) -> Result<(), Denied> {
        match self.options.on_resolution_failure {
            ResolutionFailurePolicy::Allow => {
                tracing::warn!(
                    host = %host,
                    "DNS resolution failed ({}); allowing per policy",
                    why
                );
                Ok(())
            }
            ResolutionFailurePolicy::Deny => Err(Denied::new(
                DenyReason::UnresolvableHost,
                format!("could not resolve {host}: {why}"),
            )),
        }
    }
}

/// A URL the gate allowed, in the form it was judged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedUrl {
    pub url: url::Url,
    /// Addresses the host was checked against. Empty when resolution failed
    /// and the policy let the URL through.
    pub addresses: Vec<IpAddr>,
}

impl AdmittedUrl {
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Pin for the transport. `None` for literal IP hosts and for hosts the
    /// gate could not resolve.
    pub fn pin(&self) -> Option<HostPin> {
        match self.url.host() {
            Some(url::Host::Domain(name)) if !self.addresses.is_empty() => Some(HostPin {
                host: name.to_string(),
                port: self.url.port_or_known_default()?,
                addresses: self.addresses.clone(),
            }),
            _ => None,
        }
    }
}

/// First non-public address (in resolver order) decides the reason.
fn check_addresses(host: &str, addrs: &[IpAddr]) -> Result<(), Denied> {
    for ip in addrs {
        if let Some(reason) = classify_ip(*ip).deny_reason() {
            return Err(Denied::new(reason, format!("{host} -> {ip}")));
        }
    }
    Ok(())
}
