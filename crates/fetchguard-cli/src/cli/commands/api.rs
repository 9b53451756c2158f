//! `fetchguard api <method> <base_url> <endpoint>` – one JSON API call.

use anyhow::{Context, Result};
use fetchguard_core::client::ApiClient;
use fetchguard_core::config::GuardConfig;
use fetchguard_core::gate::UrlGate;
use fetchguard_core::http::Method;
use serde_json::Value;

pub async fn run_api(
    cfg: &GuardConfig,
    method: Method,
    base_url: &str,
    endpoint: &str,
    data: Option<&str>,
    api_key: Option<String>,
) -> Result<()> {
    let body: Option<Value> = data
        .map(serde_json::from_str)
        .transpose()
        .context("--data is not valid JSON")?;

    let gate = UrlGate::with_system_resolver(cfg.gate.to_options());
    let client = ApiClient::from_config(base_url, cfg, api_key).with_gate(gate);
    let endpoint = endpoint.to_string();

    let resp = tokio::task::spawn_blocking(move || {
        client.request(method, &endpoint, &[], body.as_ref())
    })
    .await
    .context("api task join")??;

    println!("{}", serde_json::to_string_pretty(&resp.data)?);
    Ok(())
}
