//! `fetchguard fetch <url>` – single gated download.

use anyhow::{bail, Context, Result};
use fetchguard_core::config::GuardConfig;
use fetchguard_core::fetch::GuardedFetcher;
use fetchguard_core::gate::UrlGate;
use fetchguard_core::http::CurlTransport;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// Fetcher wired from config: system DNS, libcurl, configured redirect limit.
pub(crate) fn fetcher_from_config(cfg: &GuardConfig) -> GuardedFetcher {
    let gate = UrlGate::with_system_resolver(cfg.gate.to_options());
    GuardedFetcher::new(gate, Arc::new(CurlTransport::from_config(&cfg.http)))
        .with_max_redirects(cfg.http.max_redirects)
}

pub async fn run_fetch(cfg: &GuardConfig, url: &str, output: Option<&Path>) -> Result<()> {
    let fetcher = fetcher_from_config(cfg);
    let fetched = tokio::task::spawn_blocking({
        let url = url.to_string();
        move || fetcher.get(&url)
    })
    .await
    .context("fetch task join")??;

    for hop in fetched.hops.iter().skip(1) {
        eprintln!("-> {}", hop);
    }
    let resp = &fetched.response;
    if !resp.is_success() {
        bail!("HTTP {} from {}", resp.status, resp.url);
    }

    match output {
        Some(path) => {
            std::fs::write(path, &resp.body)
                .with_context(|| format!("write {}", path.display()))?;
            println!("Saved {} bytes to {}", resp.body.len(), path.display());
        }
        None => {
            let mut out = std::io::stdout().lock();
            out.write_all(&resp.body)?;
            out.flush()?;
        }
    }
    Ok(())
}
