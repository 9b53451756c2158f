//! Host resolver interface used by the URL safety gate.
//!
//! The gate only depends on this trait and never performs lookups itself, so
//! tests and the CLI can pin answers (`--resolve host=ip`) while production
//! code asks the system resolver.

use std::collections::HashMap;
use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// Turns a hostname into every address it currently resolves to (A and AAAA).
pub trait HostResolver: Send + Sync {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the platform's `getaddrinfo`.
///
/// Blocks the calling thread; call from `spawn_blocking` if used from async code.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let mut out: Vec<IpAddr> = Vec::new();
        for addr in (host, 0u16).to_socket_addrs()? {
            let ip = addr.ip();
            if !out.contains(&ip) {
                out.push(ip);
            }
        }
        Ok(out)
    }
}

/// Fixed host → addresses table, optionally falling back to another resolver.
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
    fallback: Option<Box<dyn HostResolver>>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or extends) the answer set for `host`. Hostnames are case-insensitive.
    pub fn with(mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.insert(host, ips);
        self
    }

    pub fn insert(&mut self, host: &str, ips: impl IntoIterator<Item = IpAddr>) {
        self.entries
            .entry(normalize(host))
            .or_default()
            .extend(ips);
    }

    /// Hosts not in the table are passed to `fallback`.
    pub fn with_fallback(mut self, fallback: impl HostResolver + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }
}

impl HostResolver for StaticResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        if let Some(ips) = self.entries.get(&normalize(host)) {
            return Ok(ips.clone());
        }
        match &self.fallback {
            Some(inner) => inner.resolve(host),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no static entry for host {host}"),
            )),
        }
    }
}

fn normalize(host: &str) -> String {
    host.trim_end_matches('.').to_ascii_lowercase()
}

/// Parses a `host=ip` override as accepted by `fetchguard check --resolve`.
pub fn parse_override(s: &str) -> anyhow::Result<(String, IpAddr)> {
    let (host, ip) = s
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected host=ip, got {s:?}"))?;
    let host = host.trim();
    if host.is_empty() {
        anyhow::bail!("empty host in resolve override {s:?}");
    }
    let ip: IpAddr = ip
        .trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid address in {s:?}: {e}"))?;
    Ok((host.to_string(), ip))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn static_resolver_is_case_insensitive() {
        let r = StaticResolver::new().with("Example.COM", [IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))]);
        assert_eq!(
            r.resolve("example.com.").unwrap(),
            vec![IpAddr::V4(Ipv4Addr::new(1, 2, 3, 4))]
        );
    }

    #[test]
    fn static_resolver_missing_host_errors() {
        let r = StaticResolver::new();
        let err = r.resolve("nowhere.test").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn static_resolver_uses_fallback() {
        let inner = StaticResolver::new().with("b.test", [IpAddr::V6(Ipv6Addr::LOCALHOST)]);
        let r = StaticResolver::new()
            .with("a.test", [IpAddr::V4(Ipv4Addr::LOCALHOST)])
            .with_fallback(inner);
        assert_eq!(r.resolve("b.test").unwrap(), vec![IpAddr::V6(Ipv6Addr::LOCALHOST)]);
    }

    #[test]
    fn insert_extends_answers() {
        let mut r = StaticResolver::new();
        r.insert("multi.test", [IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34))]);
        r.insert("multi.test", [IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1))]);
        assert_eq!(r.resolve("multi.test").unwrap().len(), 2);
    }

    #[test]
    fn parse_override_v4_and_v6() {
        let (h, ip) = parse_override("example.com=93.184.216.34").unwrap();
        assert_eq!(h, "example.com");
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::new(93, 184, 216, 34)));
        let (_, ip6) = parse_override("v6.test=[::1]").unwrap();
        assert_eq!(ip6, IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn parse_override_rejects_garbage() {
        assert!(parse_override("example.com").is_err());
        assert!(parse_override("=1.2.3.4").is_err());
        assert!(parse_override("a.test=not-an-ip").is_err());
    }
}
