//! `fetchguard check <url>...` – gate decisions without fetching.

use anyhow::{Context, Result};
use fetchguard_core::config::GuardConfig;
use fetchguard_core::gate::{GateDecision, ResolutionFailurePolicy, UrlGate};
use fetchguard_core::resolver::{parse_override, HostResolver, StaticResolver, SystemResolver};
use std::sync::Arc;

/// `--resolve` pins consult first; other hosts go to the system resolver.
fn build_resolver(overrides: &[String]) -> Result<Arc<dyn HostResolver>> {
    if overrides.is_empty() {
        return Ok(Arc::new(SystemResolver));
    }
    let mut pinned = StaticResolver::new();
    for o in overrides {
        let (host, ip) = parse_override(o)?;
        pinned.insert(&host, [ip]);
    }
    Ok(Arc::new(pinned.with_fallback(SystemResolver)))
}

fn json_line(url: &str, decision: &GateDecision) -> Result<String> {
    let mut value = serde_json::to_value(decision)?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("url".to_string(), serde_json::Value::String(url.to_string()));
    }
    Ok(value.to_string())
}

/// Prints one decision per URL. Returns `true` when every URL is allowed.
pub async fn run_check(
    cfg: &GuardConfig,
    urls: &[String],
    overrides: &[String],
    policy: Option<ResolutionFailurePolicy>,
    json: bool,
) -> Result<bool> {
    let mut options = cfg.gate.to_options();
    if let Some(p) = policy {
        options.on_resolution_failure = p;
    }
    let gate = UrlGate::new(options, build_resolver(overrides)?);

    let decisions = tokio::task::spawn_blocking({
        let urls = urls.to_vec();
        move || {
            urls.into_iter()
                .map(|u| {
                    let d = gate.evaluate(&u);
                    (u, d)
                })
                .collect::<Vec<_>>()
        }
    })
    .await
    .context("gate task join")?;

    let mut all_allowed = true;
    for (url, decision) in &decisions {
        all_allowed &= decision.is_allowed();
        if json {
            println!("{}", json_line(url, decision)?);
        } else {
            println!("{:<5} {}", if decision.is_allowed() { "ALLOW" } else { "DENY" }, url);
            if let GateDecision::Deny { reason, detail } = decision {
                println!("      {}: {}", reason, detail);
            }
        }
    }
    Ok(all_allowed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fetchguard_core::gate::DenyReason;

    #[test]
    fn json_line_includes_url() {
        let denied = GateDecision::deny(DenyReason::Loopback, "127.0.0.1");
        let line = json_line("http://127.0.0.1/", &denied).unwrap();
        let v: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["url"], "http://127.0.0.1/");
        assert_eq!(v["decision"], "DENY");
        assert_eq!(v["reason"], "LOOPBACK");
    }

    #[test]
    fn pinned_hosts_resolve_without_dns() {
        let resolver = build_resolver(&["internal.test=10.1.2.3".to_string()]).unwrap();
        let ips = resolver.resolve("internal.test").unwrap();
        assert_eq!(ips, vec!["10.1.2.3".parse::<std::net::IpAddr>().unwrap()]);
    }

    #[test]
    fn bad_override_is_error() {
        assert!(build_resolver(&["no-equals-sign".to_string()]).is_err());
    }
}
