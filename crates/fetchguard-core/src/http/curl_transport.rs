//! libcurl-backed transport (one `Easy` handle per request).

use std::net::IpAddr;
use std::str;
use std::time::Duration;

use super::{
    parse_header_lines, HostPin, HttpRequest, HttpResponse, Method, Transport, TransportError,
};
use crate::config::HttpConfig;

/// Blocking transport. Runs in the current thread; call from `spawn_blocking`
/// if used from async code.
#[derive(Debug, Clone)]
pub struct CurlTransport {
    connect_timeout: Duration,
    timeout: Duration,
    user_agent: String,
}

impl Default for CurlTransport {
    fn default() -> Self {
        Self::from_config(&HttpConfig::default())
    }
}

impl CurlTransport {
    pub fn from_config(cfg: &HttpConfig) -> Self {
        let connect = if cfg.connect_timeout_secs.is_finite() && cfg.connect_timeout_secs > 0.0 {
            Duration::from_secs_f64(cfg.connect_timeout_secs)
        } else {
            Duration::from_secs(10)
        };
        Self {
            connect_timeout: connect,
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            user_agent: cfg.user_agent.clone(),
        }
    }
}

fn header_line(name: &str, value: &str) -> Result<String, TransportError> {
    let bad = |s: &str| s.contains('\r') || s.contains('\n');
    if name.trim().is_empty() || bad(name) || bad(value) || name.contains(':') {
        return Err(TransportError::InvalidRequest(format!(
            "invalid header {name:?}"
        )));
    }
    Ok(format!("{}: {}", name.trim(), value.trim()))
}

/// `CURLOPT_RESOLVE` entries (`host:port:addr[,addr]`) for a pin. A host
/// written with a trailing dot gets a second entry without it.
fn resolve_entries(pin: &HostPin) -> Vec<String> {
    let addrs: Vec<String> = pin
        .addresses
        .iter()
        .map(|ip| match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        })
        .collect();
    let addrs = addrs.join(",");

    let mut entries = vec![format!("{}:{}:{}", pin.host, pin.port, addrs)];
    let bare = pin.host.trim_end_matches('.');
    if bare != pin.host {
        entries.push(format!("{}:{}:{}", bare, pin.port, addrs));
    }
    entries
}

impl Transport for CurlTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut header_lines: Vec<String> = Vec::new();
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(&request.url)?;
        easy.follow_location(false)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;
        easy.useragent(&self.user_agent)?;
        easy.ssl_verify_peer(true)?;
        easy.ssl_verify_host(true)?;

        if let Some(pin) = request.pin.as_ref().filter(|p| !p.addresses.is_empty()) {
            let mut resolve = curl::easy::List::new();
            for entry in resolve_entries(pin) {
                resolve.append(&entry)?;
            }
            easy.resolve(resolve)?;
            // A proxy would resolve the name itself.
            easy.noproxy("*")?;
            tracing::debug!(host = %pin.host, port = pin.port, "pinned to {:?}", pin.addresses);
        }

        match request.method {
            Method::Get => easy.get(true)?,
            Method::Head => easy.nobody(true)?,
            Method::Post => easy.post(true)?,
            Method::Put | Method::Patch | Method::Delete => {
                easy.custom_request(request.method.as_str())?
            }
        }
        if let Some(payload) = &request.body {
            if request.method != Method::Head {
                easy.post_fields_copy(payload)?;
                if request.method != Method::Post {
                    // post_fields_copy switches libcurl to POST; restore the verb.
                    easy.custom_request(request.method.as_str())?;
                }
            }
        }

        let mut list = curl::easy::List::new();
        for (k, v) in &request.headers {
            list.append(&header_line(k, v)?)?;
        }
        if !request.headers.is_empty() {
            easy.http_headers(list)?;
        }

        {
            let mut transfer = easy.transfer();
            transfer.header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    header_lines.push(s.trim_end().to_string());
                }
                true
            })?;
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform()?;
        }

        let status = easy.response_code()?;
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status,
            bytes = body.len(),
            "request complete"
        );

        Ok(HttpResponse {
            status,
            headers: parse_header_lines(&header_lines),
            body,
            url: request.url.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_rejects_injection() {
        assert!(header_line("X-Test", "a\r\nHost: evil").is_err());
        assert!(header_line("Bad:Name", "v").is_err());
        assert!(header_line(" ", "v").is_err());
        assert_eq!(header_line(" Accept ", " */* ").unwrap(), "Accept: */*");
    }

    #[test]
    fn resolve_entries_bracket_ipv6() {
        let pin = HostPin {
            host: "api.test".to_string(),
            port: 443,
            addresses: vec!["93.184.216.34".parse().unwrap(), "2001:db8::1".parse().unwrap()],
        };
        assert_eq!(resolve_entries(&pin), vec!["api.test:443:93.184.216.34,[2001:db8::1]"]);
    }

    #[test]
    fn resolve_entries_cover_trailing_dot() {
        let pin = HostPin {
            host: "api.test.".to_string(),
            port: 80,
            addresses: vec!["93.184.216.34".parse().unwrap()],
        };
        assert_eq!(
            resolve_entries(&pin),
            vec!["api.test.:80:93.184.216.34", "api.test:80:93.184.216.34"]
        );
    }

    #[test]
    fn from_config_clamps_timeouts() {
        let cfg = HttpConfig {
            connect_timeout_secs: -1.0,
            timeout_secs: 0,
            ..HttpConfig::default()
        };
        let t = CurlTransport::from_config(&cfg);
        assert_eq!(t.connect_timeout, Duration::from_secs(10));
        assert_eq!(t.timeout, Duration::from_secs(1));
    }
}
