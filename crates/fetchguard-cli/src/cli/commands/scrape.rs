//! `fetchguard scrape <base_url>` – paginated gated fetch and article extraction.

use anyhow::{bail, Context, Result};
use fetchguard_core::config::GuardConfig;
use fetchguard_core::scrape::Scraper;
use std::time::Duration;

use super::fetch::fetcher_from_config;

pub async fn run_scrape(
    cfg: &GuardConfig,
    base_url: &str,
    pages: u32,
    delay: f64,
    json: bool,
) -> Result<()> {
    if !delay.is_finite() || delay < 0.0 {
        bail!("--delay must be a non-negative number of seconds");
    }
    let layout = cfg.scrape.to_layout();
    let scraper = Scraper::with_layout(fetcher_from_config(cfg), base_url, &layout)
        .context("invalid [scrape] selectors in config")?;
    let articles = tokio::task::spawn_blocking(move || {
        scraper.scrape(pages, Duration::from_secs_f64(delay))
    })
    .await
    .context("scrape task join")?;

    if json {
        for a in &articles {
            println!("{}", serde_json::to_string(a)?);
        }
        return Ok(());
    }

    println!("{:<10}  {:<40}  {}", "DATE", "TITLE", "LINK");
    for a in &articles {
        println!(
            "{:<10}  {:<40}  {}",
            a.published_date.as_deref().unwrap_or("-"),
            a.title,
            a.link
        );
    }
    println!("Found {} articles on {} pages.", articles.len(), pages);
    Ok(())
}
