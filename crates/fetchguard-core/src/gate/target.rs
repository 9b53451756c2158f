//! Parsing a candidate URL into the parts the gate inspects.

use std::net::IpAddr;

/// Host portion of a candidate URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetHost {
    /// DNS name as normalized by the URL parser (lower-case, IDNA applied).
    Domain(String),
    /// Literal address; never resolved.
    Ip(IpAddr),
}

/// A candidate URL split into `{scheme, host, port, path}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub scheme: String,
    /// `None` when the URL has no authority (e.g. `mailto:` or `data:`).
    pub host: Option<TargetHost>,
    /// Textual host as it appears in the URL (`[::1]` for IPv6).
    pub host_text: String,
    pub port: Option<u16>,
    pub path: String,
    /// The parsed URL itself; its serialization is what gets sent.
    pub url: url::Url,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// Parser rejected the text outright.
    Invalid(String),
    /// Syntax was fine apart from an empty authority; carries the textual scheme.
    EmptyHost { scheme: String },
}

/// Parses `text` with the WHATWG URL parser.
pub fn parse_target(text: &str) -> Result<Target, TargetError> {
    let parsed = match url::Url::parse(text) {
        Ok(u) => u,
        Err(url::ParseError::EmptyHost) => {
            let scheme = text
                .trim()
                .split_once(':')
                .map(|(s, _)| s.to_ascii_lowercase())
                .unwrap_or_default();
            return Err(TargetError::EmptyHost { scheme });
        }
        Err(e) => return Err(TargetError::Invalid(e.to_string())),
    };

    let host = match parsed.host() {
        Some(url::Host::Domain(d)) if !d.is_empty() => Some(TargetHost::Domain(d.to_string())),
        Some(url::Host::Domain(_)) | None => None,
        Some(url::Host::Ipv4(v4)) => Some(TargetHost::Ip(IpAddr::V4(v4))),
        Some(url::Host::Ipv6(v6)) => Some(TargetHost::Ip(IpAddr::V6(v6))),
    };

    Ok(Target {
        scheme: parsed.scheme().to_string(),
        host,
        host_text: parsed.host_str().unwrap_or_default().to_string(),
        port: parsed.port_or_known_default(),
        path: parsed.path().to_string(),
        url: parsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[test]
    fn parses_domain_target() {
        let t = parse_target("HTTPS://Example.COM/a/b?q=1").unwrap();
        assert_eq!(t.scheme, "https");
        assert_eq!(t.host, Some(TargetHost::Domain("example.com".to_string())));
        assert_eq!(t.port, Some(443));
        assert_eq!(t.path, "/a/b");
    }

    #[test]
    fn parses_ip_literals() {
        let t = parse_target("http://127.0.0.1:8080/").unwrap();
        assert_eq!(t.host, Some(TargetHost::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST))));
        assert_eq!(t.port, Some(8080));

        let t6 = parse_target("http://[::1]/").unwrap();
        assert_eq!(t6.host, Some(TargetHost::Ip(IpAddr::V6(Ipv6Addr::LOCALHOST))));
        assert_eq!(t6.host_text, "[::1]");
    }

    #[test]
    fn shorthand_ipv4_is_normalized() {
        let t = parse_target("http://127.1/").unwrap();
        assert_eq!(t.host, Some(TargetHost::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST))));
    }

    #[test]
    fn relative_text_is_invalid() {
        assert!(matches!(parse_target("not a url"), Err(TargetError::Invalid(_))));
        assert!(matches!(parse_target(""), Err(TargetError::Invalid(_))));
    }

    #[test]
    fn empty_authority_reports_scheme() {
        assert_eq!(
            parse_target("http://:80/x"),
            Err(TargetError::EmptyHost {
                scheme: "http".to_string()
            })
        );
    }

    #[test]
    fn backslash_ends_authority() {
        let t = parse_target("http://public.test\\@127.0.0.1:8080/secret").unwrap();
        assert_eq!(t.host, Some(TargetHost::Domain("public.test".to_string())));
        assert_eq!(t.port, Some(80));
        assert_eq!(t.url.as_str(), "http://public.test/@127.0.0.1:8080/secret");
    }

    #[test]
    fn hostless_scheme() {
        let t = parse_target("mailto:someone@example.com").unwrap();
        assert_eq!(t.scheme, "mailto");
        assert!(t.host.is_none());
    }
}
